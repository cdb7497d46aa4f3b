// Gameplay tuning values, grouped by concern. Runtime/server constants
// (ports, channel capacities) live in `frameworks::config` instead.

use std::time::Duration;

/// Map generation and destruction odds.
#[derive(Debug, Clone, Copy)]
pub struct MapTuning {
    /// Chance that an open interior cell starts as a destructible block.
    pub destructible_chance: f64,
    /// Chance that a destroyed block leaves an item behind.
    pub item_drop_chance: f64,
}

impl Default for MapTuning {
    fn default() -> Self {
        Self {
            destructible_chance: 0.6,
            // Items roll uniformly across the three kinds once this hits.
            item_drop_chance: 0.3,
        }
    }
}

/// Starting stats and speed-upgrade behaviour for players.
#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    pub bomb_capacity: u32,
    pub blast_range: u32,
    /// Client-side tween duration for one cell of movement.
    pub move_interval_ms: u32,
    /// How much each speed item shaves off the move interval.
    pub speed_step_ms: u32,
    /// Floor for the move interval regardless of speed level.
    pub min_move_interval_ms: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            bomb_capacity: 1,
            blast_range: 1,
            move_interval_ms: 280,
            speed_step_ms: 25,
            min_move_interval_ms: 100,
        }
    }
}

/// Bomb fuse and chain-reaction limits.
#[derive(Debug, Clone, Copy)]
pub struct BombTuning {
    pub fuse: Duration,
    /// Upper bound on bombs resolved in one chain. The grid is finite so a
    /// chain terminates on its own; the cap guards future rule changes.
    pub chain_limit: usize,
}

impl Default for BombTuning {
    fn default() -> Self {
        Self {
            fuse: Duration::from_millis(3000),
            chain_limit: 64,
        }
    }
}
