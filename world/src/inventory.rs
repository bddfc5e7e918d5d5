//! Hotbar, storage slots and named item counters.

use std::collections::BTreeMap;

use scrapfield_core::{ItemGrant, ItemId, HOTBAR_SLOTS, INVENTORY_SLOTS};
use thiserror::Error;

/// Counter name tracking remaining lives.
pub const LIVES: &str = "Lives";
/// Counter name tracking hit points.
pub const HEALTH: &str = "Health";
/// Counter name tracking food rations.
pub const FOOD: &str = "Food";
/// Name of the breakable block item.
pub const WOODEN_BLOCK: &str = "WoodenBlock";

/// Errors raised by slot operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The index does not name a slot.
    #[error("slot {slot} does not exist")]
    SlotOutOfRange {
        /// Requested index.
        slot: usize,
    },
    /// The index names a storage slot where a hotbar slot is required.
    #[error("slot {slot} is not on the hotbar")]
    NotHotbar {
        /// Requested index.
        slot: usize,
    },
    /// The slot holds nothing.
    #[error("slot {slot} is empty")]
    EmptySlot {
        /// Requested index.
        slot: usize,
    },
}

/// Contents of one inventory slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InventorySlot {
    name: String,
    id: ItemId,
    quantity: u32,
    max: u32,
}

impl InventorySlot {
    /// Item name held by the slot; empty for the sentinel.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Item identifier held by the slot.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Units held by the slot.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Stack limit of the item held by the slot.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Reports whether the slot equals the empty sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Bounded count of a named item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counter {
    count: u32,
    max: u32,
}

impl Counter {
    /// Units currently held.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Upper bound of the count.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }
}

/// Result of adding items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct AddOutcome {
    pub(crate) stored: u32,
    pub(crate) overflow: u32,
}

/// The player's inventory.
#[derive(Clone, Debug)]
pub struct Inventory {
    slots: Vec<InventorySlot>,
    counters: BTreeMap<String, Counter>,
    selected: usize,
}

impl Inventory {
    /// Inventory holding the starting counters and empty slots.
    #[must_use]
    pub(crate) fn starting() -> Self {
        let mut inventory = Self {
            slots: vec![InventorySlot::default(); INVENTORY_SLOTS],
            counters: BTreeMap::new(),
            selected: 0,
        };
        inventory.set_counter(LIVES, 3, 3);
        inventory.set_counter(HEALTH, 100, 100);
        inventory.set_counter(FOOD, 3, 3);
        inventory.set_counter(WOODEN_BLOCK, 0, 999);
        inventory
    }

    /// Every slot, hotbar first.
    #[must_use]
    pub fn slots(&self) -> &[InventorySlot] {
        &self.slots
    }

    /// Slot at the provided index.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&InventorySlot> {
        self.slots.get(index)
    }

    /// Index of the selected hotbar slot.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Contents of the selected hotbar slot.
    #[must_use]
    pub fn selected_slot(&self) -> &InventorySlot {
        &self.slots[self.selected]
    }

    /// Counter registered under the name.
    #[must_use]
    pub fn counter(&self, name: &str) -> Option<Counter> {
        self.counters.get(name).copied()
    }

    /// Units counted under the name, zero when unknown.
    #[must_use]
    pub fn count(&self, name: &str) -> u32 {
        self.counter(name).map_or(0, |counter| counter.count)
    }

    /// Iterator over every counter in name order.
    pub fn counters(&self) -> impl Iterator<Item = (&str, Counter)> {
        self.counters
            .iter()
            .map(|(name, counter)| (name.as_str(), *counter))
    }

    pub(crate) fn set_counter(&mut self, name: &str, count: u32, max: u32) {
        let _ = self.counters.insert(
            name.to_owned(),
            Counter {
                count: count.min(max),
                max,
            },
        );
    }

    /// Adds `delta` to the named counter, clamping into `[0, max]`, and
    /// returns the new count.
    pub(crate) fn adjust_counter(&mut self, name: &str, delta: i64) -> u32 {
        let Some(counter) = self.counters.get_mut(name) else {
            return 0;
        };
        let adjusted = (i64::from(counter.count) + delta).clamp(0, i64::from(counter.max));
        counter.count = u32::try_from(adjusted).unwrap_or(0);
        counter.count
    }

    /// Counter for a slot-backed item, widened so that it can track every
    /// unit the slots are able to hold.
    fn counter_entry(&mut self, name: &str, stack_max: u32) -> &mut Counter {
        let capacity = stack_max.saturating_mul(self.slots.len() as u32);
        let counter = self
            .counters
            .entry(name.to_owned())
            .or_insert(Counter { count: 0, max: 0 });
        counter.max = counter.max.max(capacity);
        counter
    }

    /// Stores the grant unit by unit: a matching stack below the limit first,
    /// then the first empty slot, otherwise the unit overflows.
    pub(crate) fn add_item(&mut self, grant: &ItemGrant) -> AddOutcome {
        let mut outcome = AddOutcome::default();
        for _ in 0..grant.amount {
            let stack = self.slots.iter().position(|slot| {
                !slot.is_empty() && slot.name == grant.name && slot.quantity < grant.max
            });
            let target = stack.or_else(|| self.slots.iter().position(InventorySlot::is_empty));
            let Some(index) = target else {
                outcome.overflow += 1;
                continue;
            };

            let slot = &mut self.slots[index];
            if slot.is_empty() {
                slot.name = grant.name.clone();
                slot.id = grant.id;
                slot.max = grant.max;
            }
            slot.quantity += 1;
            outcome.stored += 1;
        }

        if outcome.stored > 0 {
            let counter = self.counter_entry(&grant.name, grant.max);
            counter.count = counter.count.saturating_add(outcome.stored).min(counter.max);
        }
        outcome
    }

    /// Reports whether at least one unit of the grant would be stored.
    #[must_use]
    pub fn has_room_for(&self, grant: &ItemGrant) -> bool {
        self.slots.iter().any(|slot| {
            slot.is_empty() || (slot.name == grant.name && slot.quantity < grant.max)
        })
    }

    /// Removes up to `amount` units from the slot and returns them as a grant
    /// carrying the slot's stack limit.
    pub(crate) fn remove_from_slot(
        &mut self,
        index: usize,
        amount: u32,
    ) -> Result<ItemGrant, InventoryError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(InventoryError::SlotOutOfRange { slot: index })?;
        if slot.is_empty() {
            return Err(InventoryError::EmptySlot { slot: index });
        }

        let removed = amount.min(slot.quantity);
        slot.quantity -= removed;
        let taken = ItemGrant::new(slot.name.clone(), slot.id, removed, slot.max);
        if slot.quantity == 0 {
            slot.clear();
        }
        let _ = self.adjust_counter(&taken.name, -i64::from(removed));
        Ok(taken)
    }

    /// Removes `amount` units of the named item across slots, lowest index
    /// first, and decrements its counter.
    pub(crate) fn remove_named(&mut self, name: &str, amount: u32) {
        let mut remaining = amount;
        for slot in self.slots.iter_mut().filter(|slot| slot.name == name) {
            if remaining == 0 {
                break;
            }
            let taken = remaining.min(slot.quantity);
            slot.quantity -= taken;
            remaining -= taken;
            if slot.quantity == 0 {
                slot.clear();
            }
        }
        let _ = self.adjust_counter(name, -i64::from(amount));
    }

    pub(crate) fn swap_slots(&mut self, first: usize, second: usize) -> Result<(), InventoryError> {
        for slot in [first, second] {
            if slot >= self.slots.len() {
                return Err(InventoryError::SlotOutOfRange { slot });
            }
        }
        self.slots.swap(first, second);
        Ok(())
    }

    pub(crate) fn select_slot(&mut self, index: usize) -> Result<(), InventoryError> {
        if index >= self.slots.len() {
            return Err(InventoryError::SlotOutOfRange { slot: index });
        }
        if index >= HOTBAR_SLOTS {
            return Err(InventoryError::NotHotbar { slot: index });
        }
        self.selected = index;
        Ok(())
    }
}
