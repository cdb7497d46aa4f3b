// Inputs and outputs of the world task. Wire encoding lives in
// `interface_adapters::protocol`; these stay plain domain-facing structs.

use crate::domain::{Cell, Direction, Grid, Player, PlayerId, Tile};

/// Everything that can mutate the world, funnelled through one channel so
/// mutations never interleave. Fuse expiries re-enter through the same
/// channel as client intents.
#[derive(Debug, Clone)]
pub enum GameEvent {
    Join { player_id: PlayerId },
    Leave { player_id: PlayerId },
    Move { player_id: PlayerId, direction: Direction },
    PlaceBomb { player_id: PlayerId },
    FuseExpired { cell: Cell },
}

/// Who should receive an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    /// Everyone except the named player (join announcements).
    Others(PlayerId),
    /// Only the named player (snapshots, stats, rejected moves).
    Player(PlayerId),
}

/// One state-delta event plus its audience. Connection tasks subscribe to a
/// single broadcast channel and filter, so every client observes deltas in
/// the exact order the engine produced them.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub target: Target,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn all(event: ServerEvent) -> Self {
        Self {
            target: Target::All,
            event,
        }
    }

    pub fn others(player_id: PlayerId, event: ServerEvent) -> Self {
        Self {
            target: Target::Others(player_id),
            event,
        }
    }

    pub fn to(player_id: PlayerId, event: ServerEvent) -> Self {
        Self {
            target: Target::Player(player_id),
            event,
        }
    }
}

/// Public view of a player, sent on join and in map snapshots.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub cell: Cell,
    pub facing: Direction,
    pub bomb_capacity: u32,
    pub blast_range: u32,
    pub speed_level: u32,
    pub move_interval_ms: u32,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            cell: p.cell,
            facing: p.facing,
            bomb_capacity: p.bomb_capacity,
            blast_range: p.blast_range,
            speed_level: p.speed_level,
            move_interval_ms: p.move_interval_ms,
        }
    }
}

/// State-delta events broadcast to clients.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    MapInit {
        grid: Grid,
        players: Vec<PlayerSnapshot>,
    },
    PlayerJoined(PlayerSnapshot),
    PlayerLeft {
        player_id: PlayerId,
    },
    PlayerMoved {
        player_id: PlayerId,
        cell: Cell,
        direction: Direction,
        /// Client-side tween duration; zero signals a rejected move.
        duration_ms: u32,
    },
    TileChanged {
        cell: Cell,
        tile: Tile,
    },
    Explosion {
        affected: Vec<Cell>,
    },
    PlayerEliminated {
        player_id: PlayerId,
    },
    StatsChanged {
        bomb_capacity: u32,
        blast_range: u32,
        speed_level: u32,
    },
}
