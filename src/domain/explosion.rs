// Blast propagation: the core detonation algorithm, including chain
// reactions, block destruction and item drops.

use crate::domain::bombs::BombTable;
use crate::domain::grid::{Cell, Grid, Tile};
use crate::domain::player::PlayerRegistry;
use crate::domain::tuning::{BombTuning, MapTuning};
use rand::Rng;
use tracing::warn;

/// Everything one detonation chain did to the grid, in the order it
/// happened. `affected` is deduplicated and includes every origin.
#[derive(Debug)]
pub struct Detonation {
    pub tile_changes: Vec<(Cell, Tile)>,
    pub affected: Vec<Cell>,
}

/// Detonates the bomb at `origin` and every bomb its blast reaches,
/// synchronously. Returns `None` when no bomb is armed there (the fuse
/// timer racing a chained detonation, or a round reset) - a no-op by
/// contract, not an error.
///
/// Chained bombs are resolved from an explicit worklist rather than by
/// recursion; each bomb propagates with its own owner's blast range, and
/// ranges never add up across a chain.
pub fn detonate<R: Rng>(
    origin: Cell,
    grid: &mut Grid,
    bombs: &mut BombTable,
    players: &mut PlayerRegistry,
    rng: &mut R,
    map: &MapTuning,
    tuning: &BombTuning,
) -> Option<Detonation> {
    if !bombs.contains(origin) {
        return None;
    }

    let mut tile_changes: Vec<(Cell, Tile)> = Vec::new();
    let mut affected: Vec<Cell> = Vec::new();
    let mut pending: Vec<Cell> = vec![origin];
    let mut resolved = 0usize;

    // First-occurrence dedup keeps the affected list stable for clients
    // and guarantees at most one elimination check per cell.
    let mark = |cell: Cell, affected: &mut Vec<Cell>| {
        if !affected.contains(&cell) {
            affected.push(cell);
        }
    };

    while let Some(cell) = pending.pop() {
        if resolved >= tuning.chain_limit {
            // Left armed and untouched; its own fuse timer resolves it.
            warn!(?cell, limit = tuning.chain_limit, "chain limit hit; deferring bomb");
            continue;
        }

        // A bomb can be queued and then consumed by an earlier pop; skip it.
        let Some(bomb) = bombs.take(cell) else {
            continue;
        };
        resolved += 1;

        // Orphaned bombs (owner disconnected) keep the default range and
        // skip the in-flight decrement.
        let range = match players.get_mut(bomb.owner) {
            Some(owner) => {
                owner.bombs_in_flight = owner.bombs_in_flight.saturating_sub(1);
                owner.blast_range
            }
            None => 1,
        };

        mark(cell, &mut affected);
        grid.set(cell, Tile::Grass);
        tile_changes.push((cell, Tile::Grass));

        for (dx, dy) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
            for step in 1..=range as i32 {
                let target = cell.step(dx * step, dy * step);
                let Some(tile) = grid.tile(target) else {
                    break;
                };
                match tile {
                    Tile::FixedWall => break,
                    Tile::Bomb => {
                        // The chained bomb absorbs the blast; its own
                        // detonation continues from its cell later.
                        mark(target, &mut affected);
                        pending.push(target);
                        break;
                    }
                    Tile::Destructible => {
                        mark(target, &mut affected);
                        let replacement = if rng.random_bool(map.item_drop_chance) {
                            match rng.random_range(0..3) {
                                0 => Tile::ItemExtraBomb,
                                1 => Tile::ItemExtraRange,
                                _ => Tile::ItemExtraSpeed,
                            }
                        } else {
                            Tile::Grass
                        };
                        grid.set(target, replacement);
                        tile_changes.push((target, replacement));
                        break;
                    }
                    Tile::Grass => {
                        mark(target, &mut affected);
                    }
                    _ => {
                        // An item caught in the blast burns away.
                        mark(target, &mut affected);
                        grid.set(target, Tile::Grass);
                        tile_changes.push((target, Tile::Grass));
                    }
                }
            }
        }
    }

    Some(Detonation {
        tile_changes,
        affected,
    })
}
