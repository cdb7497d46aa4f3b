// Wire protocol DTOs and conversions for the public game messages.
// Domain types never derive serde; every payload crosses through here.

use crate::domain::{Cell, Direction, Grid, Tile};
use crate::use_cases::{PlayerSnapshot, ServerEvent};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent before any game state.
    #[serde(rename_all = "camelCase")]
    Identity { player_id: String },
    // Full snapshot for the joining client.
    MapInit(MapInitDto),
    // A new player appeared (sent to everyone else).
    PlayerJoined(PlayerDto),
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: String },
    // Movement result; durationMs == 0 means the move was rejected.
    PlayerMoved(PlayerMovedDto),
    TileChanged(TileChangedDto),
    // Visual-effect trigger carrying every cell the blast touched.
    Explosion(ExplosionDto),
    #[serde(rename_all = "camelCase")]
    PlayerEliminated { player_id: String },
    // Stat delta, unicast to the affected player.
    StatsChanged(StatsDto),
}

/// Messages clients send to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    // Required first message: the client wants to enter the round.
    Join,
    Move(MoveDto),
    PlaceBomb,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDto {
    Up,
    Down,
    Left,
    Right,
}

impl From<DirectionDto> for Direction {
    fn from(d: DirectionDto) -> Self {
        match d {
            DirectionDto::Up => Direction::Up,
            DirectionDto::Down => Direction::Down,
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

impl From<Direction> for DirectionDto {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => DirectionDto::Up,
            Direction::Down => DirectionDto::Down,
            Direction::Left => DirectionDto::Left,
            Direction::Right => DirectionDto::Right,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveDto {
    pub direction: DirectionDto,
}

/// Tile codes on the wire, matching the client's tileset indices.
pub fn tile_code(tile: Tile) -> u8 {
    match tile {
        Tile::Grass => 0,
        Tile::FixedWall => 1,
        Tile::Destructible => 2,
        Tile::Bomb => 3,
        Tile::ItemExtraBomb => 4,
        Tile::ItemExtraRange => 5,
        Tile::ItemExtraSpeed => 6,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CellDto {
    pub x: i32,
    pub y: i32,
}

impl From<Cell> for CellDto {
    fn from(cell: Cell) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
        }
    }
}

/// Flattened player state for join announcements and map snapshots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub facing: DirectionDto,
    pub bomb_capacity: u32,
    pub blast_range: u32,
    pub speed_level: u32,
    pub move_interval_ms: u32,
}

impl From<&PlayerSnapshot> for PlayerDto {
    fn from(p: &PlayerSnapshot) -> Self {
        Self {
            id: p.id.to_string(),
            x: p.cell.x,
            y: p.cell.y,
            facing: p.facing.into(),
            bomb_capacity: p.bomb_capacity,
            blast_range: p.blast_range,
            speed_level: p.speed_level,
            move_interval_ms: p.move_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MapInitDto {
    // Row-major tile codes, `grid[y][x]`.
    pub grid: Vec<Vec<u8>>,
    pub players: Vec<PlayerDto>,
}

fn grid_rows(grid: &Grid) -> Vec<Vec<u8>> {
    grid.rows()
        .map(|row| row.iter().map(|&t| tile_code(t)).collect())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMovedDto {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub direction: DirectionDto,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileChangedDto {
    pub x: i32,
    pub y: i32,
    pub tile: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplosionDto {
    pub affected_cells: Vec<CellDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub bomb_capacity: u32,
    pub blast_range: u32,
    pub speed_level: u32,
}

impl From<&ServerEvent> for ServerMessage {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::MapInit { grid, players } => ServerMessage::MapInit(MapInitDto {
                grid: grid_rows(grid),
                players: players.iter().map(PlayerDto::from).collect(),
            }),
            ServerEvent::PlayerJoined(snapshot) => {
                ServerMessage::PlayerJoined(PlayerDto::from(snapshot))
            }
            ServerEvent::PlayerLeft { player_id } => ServerMessage::PlayerLeft {
                player_id: player_id.to_string(),
            },
            ServerEvent::PlayerMoved {
                player_id,
                cell,
                direction,
                duration_ms,
            } => ServerMessage::PlayerMoved(PlayerMovedDto {
                id: player_id.to_string(),
                x: cell.x,
                y: cell.y,
                direction: (*direction).into(),
                duration_ms: *duration_ms,
            }),
            ServerEvent::TileChanged { cell, tile } => ServerMessage::TileChanged(TileChangedDto {
                x: cell.x,
                y: cell.y,
                tile: tile_code(*tile),
            }),
            ServerEvent::Explosion { affected } => ServerMessage::Explosion(ExplosionDto {
                affected_cells: affected.iter().copied().map(CellDto::from).collect(),
            }),
            ServerEvent::PlayerEliminated { player_id } => ServerMessage::PlayerEliminated {
                player_id: player_id.to_string(),
            },
            ServerEvent::StatsChanged {
                bomb_capacity,
                blast_range,
                speed_level,
            } => ServerMessage::StatsChanged(StatsDto {
                bomb_capacity: *bomb_capacity,
                blast_range: *blast_range,
                speed_level: *speed_level,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_parse_from_tagged_json() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"move","data":{"direction":"left"}}"#).unwrap();
        match msg {
            ClientMessage::Move(m) => assert!(matches!(m.direction, DirectionDto::Left)),
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"placeBomb"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::PlaceBomb));
    }

    #[test]
    fn garbage_json_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"fly"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn tile_change_serializes_with_wire_names() {
        let event = ServerEvent::TileChanged {
            cell: Cell::new(3, 5),
            tile: Tile::Bomb,
        };
        let value = serde_json::to_value(ServerMessage::from(&event)).unwrap();
        assert_eq!(
            value,
            json!({"type": "tileChanged", "data": {"x": 3, "y": 5, "tile": 3}})
        );
    }

    #[test]
    fn rejected_move_serializes_zero_duration() {
        let event = ServerEvent::PlayerMoved {
            player_id: 12,
            cell: Cell::new(1, 1),
            direction: Direction::Up,
            duration_ms: 0,
        };
        let value = serde_json::to_value(ServerMessage::from(&event)).unwrap();
        assert_eq!(value["type"], "playerMoved");
        assert_eq!(value["data"]["id"], "12");
        assert_eq!(value["data"]["direction"], "up");
        assert_eq!(value["data"]["durationMs"], 0);
    }

    #[test]
    fn explosion_lists_affected_cells() {
        let event = ServerEvent::Explosion {
            affected: vec![Cell::new(1, 1), Cell::new(2, 1)],
        };
        let value = serde_json::to_value(ServerMessage::from(&event)).unwrap();
        assert_eq!(
            value["data"]["affectedCells"],
            json!([{"x": 1, "y": 1}, {"x": 2, "y": 1}])
        );
    }

    #[test]
    fn stats_payload_uses_camel_case_fields() {
        let event = ServerEvent::StatsChanged {
            bomb_capacity: 2,
            blast_range: 3,
            speed_level: 1,
        };
        let value = serde_json::to_value(ServerMessage::from(&event)).unwrap();
        assert_eq!(
            value["data"],
            json!({"bombCapacity": 2, "blastRange": 3, "speedLevel": 1})
        );
    }
}
