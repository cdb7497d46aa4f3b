// The tile grid: terrain layout, bounds checks and walkability rules.

use crate::domain::tuning::MapTuning;
use rand::Rng;

pub const MAP_WIDTH: i32 = 15;
pub const MAP_HEIGHT: i32 = 13;

/// The four corner start positions. Their Chebyshev-1 neighbourhood is kept
/// free of destructibles so a fresh spawn is never boxed in.
pub const SPAWN_POINTS: [Cell; 4] = [
    Cell { x: 1, y: 1 },
    Cell { x: 13, y: 1 },
    Cell { x: 1, y: 11 },
    Cell { x: 13, y: 11 },
];

/// Terrain/content of one grid cell. A cell holds exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Grass,
    FixedWall,
    Destructible,
    Bomb,
    ItemExtraBomb,
    ItemExtraRange,
    ItemExtraSpeed,
}

impl Tile {
    pub fn is_item(self) -> bool {
        matches!(
            self,
            Tile::ItemExtraBomb | Tile::ItemExtraRange | Tile::ItemExtraSpeed
        )
    }
}

/// Grid coordinate, origin top-left. Signed so neighbour math can step off
/// the map and get rejected by a bounds check instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev distance, used for spawn-protection radii.
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// The mutable 15x13 tile grid.
#[derive(Debug, Clone)]
pub struct Grid {
    tiles: Vec<Tile>,
}

impl Grid {
    /// Generates a fresh round layout: border and checkerboard walls, the
    /// rest rolled as destructible except around the spawn points.
    pub fn generate<R: Rng>(rng: &mut R, tuning: &MapTuning) -> Self {
        let mut tiles = Vec::with_capacity((MAP_WIDTH * MAP_HEIGHT) as usize);
        for y in 0..MAP_HEIGHT {
            for x in 0..MAP_WIDTH {
                let cell = Cell::new(x, y);
                let tile = if Self::is_permanent_wall(cell) {
                    Tile::FixedWall
                } else if !Self::near_spawn(cell)
                    && rng.random_bool(tuning.destructible_chance)
                {
                    Tile::Destructible
                } else {
                    Tile::Grass
                };
                tiles.push(tile);
            }
        }
        Self { tiles }
    }

    pub fn in_bounds(cell: Cell) -> bool {
        cell.x >= 0 && cell.x < MAP_WIDTH && cell.y >= 0 && cell.y < MAP_HEIGHT
    }

    /// Border cells plus the even/even checkerboard interior. These never
    /// change for the lifetime of a round.
    pub fn is_permanent_wall(cell: Cell) -> bool {
        cell.x == 0
            || cell.x == MAP_WIDTH - 1
            || cell.y == 0
            || cell.y == MAP_HEIGHT - 1
            || (cell.x % 2 == 0 && cell.y % 2 == 0)
    }

    fn near_spawn(cell: Cell) -> bool {
        SPAWN_POINTS.iter().any(|s| s.chebyshev(cell) <= 1)
    }

    /// Tile at a coordinate, `None` when out of bounds.
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        if Self::in_bounds(cell) {
            Some(self.tiles[(cell.y * MAP_WIDTH + cell.x) as usize])
        } else {
            None
        }
    }

    /// Overwrites a cell. Callers have already validated bounds; permanent
    /// walls must never be rewritten.
    pub fn set(&mut self, cell: Cell, tile: Tile) {
        debug_assert!(Self::in_bounds(cell));
        debug_assert!(!Self::is_permanent_wall(cell));
        self.tiles[(cell.y * MAP_WIDTH + cell.x) as usize] = tile;
    }

    /// Players may stand on grass and on items (stepping on an item picks
    /// it up). Walls, destructibles and bombs all block.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        matches!(self.tile(cell), Some(t) if t == Tile::Grass || t.is_item())
    }

    /// Row-major view for snapshot serialization.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(MAP_WIDTH as usize)
    }
}
