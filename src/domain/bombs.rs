// Armed bombs, keyed by the cell they occupy.

use crate::domain::grid::Cell;
use crate::domain::player::PlayerId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Bomb {
    pub owner: PlayerId,
    pub cell: Cell,
    pub armed_at: Instant,
    pub fuse: Duration,
}

/// All currently armed bombs. A bomb record exists exactly while its cell's
/// tile is `Tile::Bomb`; detonation (direct or chained) removes it.
#[derive(Debug, Default)]
pub struct BombTable {
    bombs: HashMap<Cell, Bomb>,
}

impl BombTable {
    pub fn arm(&mut self, owner: PlayerId, cell: Cell, fuse: Duration) {
        debug_assert!(!self.bombs.contains_key(&cell), "bomb stacked at {cell:?}");
        self.bombs.insert(
            cell,
            Bomb {
                owner,
                cell,
                armed_at: Instant::now(),
                fuse,
            },
        );
    }

    pub fn take(&mut self, cell: Cell) -> Option<Bomb> {
        self.bombs.remove(&cell)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.bombs.contains_key(&cell)
    }

    pub fn len(&self) -> usize {
        self.bombs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bombs.is_empty()
    }

    /// Drops every record. Fuse timers for cleared bombs become no-ops when
    /// they fire, since expiry checks the table first.
    pub fn clear(&mut self) {
        self.bombs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_removes_the_record() {
        let mut table = BombTable::default();
        let cell = Cell::new(1, 1);
        table.arm(42, cell, Duration::from_secs(3));
        assert!(table.contains(cell));
        let bomb = table.take(cell).expect("armed bomb");
        assert_eq!(bomb.owner, 42);
        assert_eq!(bomb.cell, cell);
        assert!(table.take(cell).is_none());
        assert!(table.is_empty());
    }
}
