//! Recipe book and the crafting transaction.

use scrapfield_core::{CraftError, ItemGrant, ItemId, RecipeId};

use crate::inventory::{AddOutcome, Inventory};

/// A recipe: ingredient requirements and the single unit it produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    ingredients: Vec<(String, u32)>,
    result: ItemGrant,
}

impl Recipe {
    /// Creates a recipe producing one unit of `name`.
    #[must_use]
    pub fn new(name: &str, id: ItemId, max: u32, ingredients: &[(&str, u32)]) -> Self {
        Self {
            ingredients: ingredients
                .iter()
                .map(|(ingredient, amount)| ((*ingredient).to_owned(), *amount))
                .collect(),
            result: ItemGrant::new(name, id, 1, max),
        }
    }

    /// Ingredient names and the units consumed, in declaration order.
    #[must_use]
    pub fn ingredients(&self) -> &[(String, u32)] {
        &self.ingredients
    }

    /// Item produced by the recipe.
    #[must_use]
    pub fn result(&self) -> &ItemGrant {
        &self.result
    }
}

/// Ordered list of recipes addressed by [`RecipeId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    /// Creates a book from explicit recipes.
    #[must_use]
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Recipes available at the crafting bench.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            Recipe::new("metalcubePLUS (block)", ItemId::new(103), 1, &[("metalcube", 4)]),
            Recipe::new("rustedwoodPLUS (block)", ItemId::new(105), 1, &[("rustedwood", 4)]),
            Recipe::new(
                "upgradealtar (block)",
                ItemId::new(104),
                1,
                &[("metalparts", 7), ("ironhorn", 5)],
            ),
            Recipe::new(
                "pistol mark1 (weapon)",
                ItemId::new(880),
                1,
                &[("firepowder", 3), ("metalparts", 4), ("rustedwood", 2)],
            ),
            Recipe::new(
                "pistol mark2 (weapon)",
                ItemId::new(881),
                1,
                &[("firepowder", 5), ("metalparts", 6), ("pistol mark1 (weapon)", 1)],
            ),
            Recipe::new(
                "energy gun (weapon)",
                ItemId::new(882),
                1,
                &[("firepowder", 10), ("metalparts", 12), ("pistol mark2 (weapon)", 1)],
            ),
            Recipe::new(
                "rusted sword (weapon)",
                ItemId::new(872),
                1,
                &[("metalparts", 5), ("rustedwood", 3)],
            ),
            Recipe::new(
                "metal sword (weapon)",
                ItemId::new(873),
                1,
                &[("metalparts", 7), ("rustedwood", 5), ("rusted sword (weapon)", 1)],
            ),
            Recipe::new(
                "photon sword (weapon)",
                ItemId::new(874),
                1,
                &[("metalparts", 14), ("rustedwood", 10), ("metal sword (weapon)", 1)],
            ),
        ])
    }

    /// Recipe stored under the identifier.
    #[must_use]
    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.recipes.get(index))
    }

    /// Identifiers and recipes in book order.
    pub fn iter(&self) -> impl Iterator<Item = (RecipeId, &Recipe)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(index, recipe)| (RecipeId::new(index as u32), recipe))
    }

    /// Checks every ingredient counter against the recipe.
    pub fn craftable(&self, inventory: &Inventory, id: RecipeId) -> Result<&Recipe, CraftError> {
        let recipe = self
            .get(id)
            .ok_or(CraftError::UnknownRecipe { recipe: id.get() })?;
        for (ingredient, required) in &recipe.ingredients {
            let available = inventory.count(ingredient);
            if available < *required {
                return Err(CraftError::Shortfall {
                    ingredient: ingredient.clone(),
                    required: *required,
                    available,
                });
            }
        }
        Ok(recipe)
    }

    /// Consumes the ingredients and stores one result unit.
    ///
    /// Craftability is re-checked first, so a failed craft leaves the
    /// inventory untouched.
    pub(crate) fn craft(
        &self,
        inventory: &mut Inventory,
        id: RecipeId,
    ) -> Result<(ItemGrant, AddOutcome), CraftError> {
        let recipe = self.craftable(inventory, id)?.clone();
        for (ingredient, required) in &recipe.ingredients {
            inventory.remove_named(ingredient, *required);
        }
        let outcome = inventory.add_item(&recipe.result);
        Ok((recipe.result, outcome))
    }
}

impl Default for RecipeBook {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wood_book() -> RecipeBook {
        RecipeBook::new(vec![Recipe::new(
            "plank (block)",
            ItemId::new(110),
            1,
            &[("wood", 4)],
        )])
    }

    #[test]
    fn shortfall_leaves_counters_untouched() {
        let book = wood_book();
        let mut inventory = Inventory::starting();
        let _ = inventory.add_item(&ItemGrant::new("wood", ItemId::new(10), 3, 10));

        let result = book.craft(&mut inventory, RecipeId::new(0));

        assert_eq!(
            result,
            Err(CraftError::Shortfall {
                ingredient: "wood".to_owned(),
                required: 4,
                available: 3,
            })
        );
        assert_eq!(inventory.count("wood"), 3);
        assert_eq!(inventory.slot(0).map(|slot| slot.quantity()), Some(3));
        assert_eq!(inventory.counter("plank (block)"), None);
    }

    #[test]
    fn craftable_is_idempotent() {
        let book = wood_book();
        let mut inventory = Inventory::starting();
        let _ = inventory.add_item(&ItemGrant::new("wood", ItemId::new(10), 4, 10));

        let first = book.craftable(&inventory, RecipeId::new(0)).is_ok();
        let second = book.craftable(&inventory, RecipeId::new(0)).is_ok();

        assert!(first);
        assert_eq!(first, second);
        assert_eq!(inventory.count("wood"), 4);
    }

    #[test]
    fn crafting_consumes_ingredients_and_adds_result() {
        let book = RecipeBook::standard();
        let mut inventory = Inventory::starting();
        let _ = inventory.add_item(&ItemGrant::new("metalparts", ItemId::new(13), 6, 10));
        let _ = inventory.add_item(&ItemGrant::new("rustedwood", ItemId::new(10), 3, 10));

        let (item, outcome) = book
            .craft(&mut inventory, RecipeId::new(6))
            .expect("rusted sword is craftable");

        assert_eq!(item.name, "rusted sword (weapon)");
        assert_eq!(outcome.stored, 1);
        assert_eq!(inventory.count("metalparts"), 1);
        assert_eq!(inventory.count("rustedwood"), 0);
        assert_eq!(inventory.count("rusted sword (weapon)"), 1);
        assert!(inventory
            .slots()
            .iter()
            .any(|slot| slot.name() == "rusted sword (weapon)"));
    }

    #[test]
    fn ingredients_beyond_one_stack_still_count() {
        let book = RecipeBook::standard();
        let mut inventory = Inventory::starting();
        let _ = inventory.add_item(&ItemGrant::new("metalparts", ItemId::new(13), 12, 10));
        let _ = inventory.add_item(&ItemGrant::new("firepowder", ItemId::new(12), 10, 10));
        let _ = inventory.add_item(&ItemGrant::new(
            "pistol mark2 (weapon)",
            ItemId::new(881),
            1,
            1,
        ));

        let (item, _) = book
            .craft(&mut inventory, RecipeId::new(5))
            .expect("energy gun is craftable");

        assert_eq!(item.name, "energy gun (weapon)");
        assert_eq!(inventory.count("metalparts"), 0);
        assert!(inventory
            .slots()
            .iter()
            .all(|slot| slot.name() != "metalparts"));
    }

    #[test]
    fn unknown_recipe_is_rejected() {
        let book = RecipeBook::standard();
        let inventory = Inventory::starting();

        assert_eq!(
            book.craftable(&inventory, RecipeId::new(99)),
            Err(CraftError::UnknownRecipe { recipe: 99 })
        );
    }
}
