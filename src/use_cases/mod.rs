// Use cases layer: the authoritative world task and its event types.

pub mod types;
pub mod world;

pub use types::{GameEvent, Outbound, PlayerSnapshot, ServerEvent, Target};
pub use world::{GameWorld, world_task};
