// Player entities, spawn assignment and stat bookkeeping.

use crate::domain::grid::{Cell, SPAWN_POINTS, Tile};
use crate::domain::tuning::PlayerTuning;
use std::collections::HashMap;

pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub cell: Cell,
    pub facing: Direction,
    pub bomb_capacity: u32,
    pub bombs_in_flight: u32,
    pub blast_range: u32,
    pub move_interval_ms: u32,
    pub speed_level: u32,
}

impl Player {
    pub fn spawn(id: PlayerId, cell: Cell, tuning: &PlayerTuning) -> Self {
        Self {
            id,
            cell,
            facing: Direction::Down,
            bomb_capacity: tuning.bomb_capacity,
            bombs_in_flight: 0,
            blast_range: tuning.blast_range,
            move_interval_ms: tuning.move_interval_ms,
            speed_level: 1,
        }
    }

    /// Applies a picked-up item to the matching stat. Returns false for
    /// non-item tiles so callers can skip the stats broadcast.
    pub fn apply_item(&mut self, item: Tile, tuning: &PlayerTuning) -> bool {
        match item {
            Tile::ItemExtraBomb => self.bomb_capacity += 1,
            Tile::ItemExtraRange => self.blast_range += 1,
            Tile::ItemExtraSpeed => {
                self.speed_level += 1;
                self.move_interval_ms = self
                    .move_interval_ms
                    .saturating_sub(tuning.speed_step_ms)
                    .max(tuning.min_move_interval_ms);
            }
            _ => return false,
        }
        true
    }
}

/// Owns every connected player for the current round.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
}

impl PlayerRegistry {
    /// Next spawn corner, round-robin over the current head count.
    pub fn next_spawn(&self) -> Cell {
        SPAWN_POINTS[self.players.len() % SPAWN_POINTS.len()]
    }

    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Ids of players standing on any of the given cells. Sorted so the
    /// elimination broadcast order is stable.
    pub fn ids_on_cells(&self, cells: &[Cell]) -> Vec<PlayerId> {
        let mut hit: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| cells.contains(&p.cell))
            .map(|p| p.id)
            .collect();
        hit.sort_unstable();
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_rotation_follows_head_count() {
        let tuning = PlayerTuning::default();
        let mut registry = PlayerRegistry::default();
        assert_eq!(registry.next_spawn(), SPAWN_POINTS[0]);
        registry.insert(Player::spawn(1, SPAWN_POINTS[0], &tuning));
        assert_eq!(registry.next_spawn(), SPAWN_POINTS[1]);
        registry.insert(Player::spawn(2, SPAWN_POINTS[1], &tuning));
        registry.insert(Player::spawn(3, SPAWN_POINTS[2], &tuning));
        registry.insert(Player::spawn(4, SPAWN_POINTS[3], &tuning));
        // Fifth join wraps back to the first corner.
        assert_eq!(registry.next_spawn(), SPAWN_POINTS[0]);
    }

    #[test]
    fn items_bump_exactly_one_stat() {
        let tuning = PlayerTuning::default();
        let mut p = Player::spawn(1, Cell::new(1, 1), &tuning);

        assert!(p.apply_item(Tile::ItemExtraBomb, &tuning));
        assert_eq!(p.bomb_capacity, 2);
        assert_eq!(p.blast_range, 1);

        assert!(p.apply_item(Tile::ItemExtraRange, &tuning));
        assert_eq!(p.blast_range, 2);

        assert!(p.apply_item(Tile::ItemExtraSpeed, &tuning));
        assert_eq!(p.speed_level, 2);
        assert_eq!(p.move_interval_ms, 255);

        assert!(!p.apply_item(Tile::Grass, &tuning));
    }

    #[test]
    fn speed_interval_never_drops_below_floor() {
        let tuning = PlayerTuning::default();
        let mut p = Player::spawn(1, Cell::new(1, 1), &tuning);
        for _ in 0..50 {
            p.apply_item(Tile::ItemExtraSpeed, &tuning);
        }
        assert_eq!(p.move_interval_ms, tuning.min_move_interval_ms);
    }

    #[test]
    fn ids_on_cells_finds_every_occupant() {
        let tuning = PlayerTuning::default();
        let mut registry = PlayerRegistry::default();
        registry.insert(Player::spawn(2, Cell::new(3, 1), &tuning));
        registry.insert(Player::spawn(1, Cell::new(3, 1), &tuning));
        registry.insert(Player::spawn(3, Cell::new(5, 5), &tuning));
        let hit = registry.ids_on_cells(&[Cell::new(3, 1), Cell::new(4, 1)]);
        assert_eq!(hit, vec![1, 2]);
    }
}
