// Domain layer: core game rules and state, free of I/O concerns.

pub mod bombs;
pub mod explosion;
pub mod grid;
pub mod player;
pub mod tuning;

pub use bombs::{Bomb, BombTable};
pub use explosion::{Detonation, detonate};
pub use grid::{Cell, Grid, MAP_HEIGHT, MAP_WIDTH, SPAWN_POINTS, Tile};
pub use player::{Direction, Player, PlayerId, PlayerRegistry};
