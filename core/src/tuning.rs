//! Gameplay constants that adapters may override from configuration files.

use serde::{Deserialize, Serialize};

use crate::GridSettings;

/// Complete set of tunable gameplay parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Grid dimensions shared by every level.
    pub grid: GridSettings,
    /// Player movement, reach and survival parameters.
    pub player: PlayerTuning,
    /// Regular enemy parameters.
    pub enemy: EnemyTuning,
    /// Boss parameters.
    pub boss: BossTuning,
    /// Projectile flight and hit parameters.
    pub projectile: ProjectileTuning,
    /// Scene clock and spawning parameters.
    pub scene: SceneTuning,
}

/// Parameters governing the player character.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Microsteps advanced per movement tick.
    pub speed: i32,
    /// Maximum distance in tiles between the player and a tile it edits.
    pub reach: f32,
    /// Seconds the primary button must be held to break a block.
    pub break_seconds: f32,
    /// Seconds of invulnerability after taking damage.
    pub iframe_seconds: f32,
    /// Initial upward velocity of a jump.
    pub jump_velocity: f32,
    /// Damage dealt per hour while no food is left.
    pub starvation_damage: i32,
    /// Damage dealt per tick while standing in an eruption.
    pub hazard_damage: i32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 1,
            reach: 3.0,
            break_seconds: 2.0,
            iframe_seconds: 1.0,
            jump_velocity: 3.5,
            starvation_damage: 10,
            hazard_damage: 10,
        }
    }
}

/// Parameters governing regular enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Microsteps advanced per movement tick.
    pub speed: i32,
    /// Hit points of a freshly spawned enemy.
    pub hp: i32,
    /// Chebyshev radius in tiles that starts a chase.
    pub chase_radius: f32,
    /// Chebyshev radius in tiles within which chasers hurt the player.
    pub contact_radius: f32,
    /// Damage dealt by chaser contact.
    pub contact_damage: i32,
    /// Seconds between shots of an aligned axis-lock enemy.
    pub fire_interval: f32,
    /// Damage dealt by enemy projectiles.
    pub projectile_damage: i32,
    /// Seconds between wanderer steps.
    pub walk_interval: f32,
    /// Ticks an idle enemy counts before its counter wraps.
    pub idle_limit: u32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            speed: 1,
            hp: 100,
            chase_radius: 6.5,
            contact_radius: 2.0,
            contact_damage: 10,
            fire_interval: 0.3,
            projectile_damage: 10,
            walk_interval: 0.3,
            idle_limit: 60,
        }
    }
}

/// Parameters governing the boss.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Hit points of the boss.
    pub hp: i32,
    /// Hit points at or below which summoning unlocks.
    pub critical_hp: i32,
    /// Ticks the boss idles before choosing an attack.
    pub idle_limit: u32,
    /// Seconds between pulse volleys.
    pub pulse_interval: f32,
    /// Volleys fired before a pulse attack ends.
    pub pulse_volleys: u32,
    /// Seconds after marking an eruption until it turns active.
    pub erupt_warning: f32,
    /// Seconds after marking an eruption until it clears.
    pub erupt_end: f32,
    /// Seconds before a teleport resolves.
    pub teleport_delay: f32,
    /// Damage dealt by boss projectiles.
    pub projectile_damage: i32,
    /// Level on which the boss lives.
    pub level: u32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            hp: 100,
            critical_hp: 30,
            idle_limit: 60,
            pulse_interval: 0.75,
            pulse_volleys: 10,
            erupt_warning: 3.0,
            erupt_end: 6.0,
            teleport_delay: 0.3,
            projectile_damage: 10,
            level: 10,
        }
    }
}

/// Parameters governing projectile flight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Microsteps travelled per tick along the flight direction.
    pub speed: f32,
    /// Half extent in tiles of the hit box around entities.
    pub hit_half_extent: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 1.0,
            hit_half_extent: 0.5,
        }
    }
}

/// Parameters governing the scene clock and ambient spawning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTuning {
    /// Real seconds per in-game hour.
    pub seconds_per_hour: f32,
    /// Seconds between ambient spawn waves.
    pub spawn_interval: f32,
    /// Enemies placed per ambient wave.
    pub spawns_per_wave: u32,
    /// Seconds between increases of the spawner multiplier.
    pub spawner_growth_interval: f32,
    /// Amount added to the spawner multiplier per increase.
    pub spawner_growth_step: u32,
    /// Upper bound of the spawner multiplier.
    pub spawner_growth_cap: u32,
    /// Ticks a spawner holds its spawn state.
    pub spawner_hold_ticks: u32,
    /// Hour at which the world starts.
    pub starting_hour: u32,
}

impl Default for SceneTuning {
    fn default() -> Self {
        Self {
            seconds_per_hour: 15.0,
            spawn_interval: 10.0,
            spawns_per_wave: 2,
            spawner_growth_interval: 20.0,
            spawner_growth_step: 100,
            spawner_growth_cap: 300,
            spawner_hold_ticks: 100,
            starting_hour: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Tuning;

    #[test]
    fn defaults_match_shipped_values() {
        let tuning = Tuning::default();
        assert_eq!(tuning.grid.columns, 32);
        assert_eq!(tuning.grid.rows, 24);
        assert_eq!(tuning.enemy.chase_radius, 6.5);
        assert_eq!(tuning.boss.pulse_volleys, 10);
        assert_eq!(tuning.scene.seconds_per_hour, 15.0);
    }
}
