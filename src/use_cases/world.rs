// The authoritative world: one task owns all game state and applies events
// strictly one at a time, so a detonation chain can never interleave with a
// move or placement.

use crate::domain::tuning::{BombTuning, MapTuning, PlayerTuning};
use crate::domain::{
    BombTable, Cell, Direction, Grid, Player, PlayerId, PlayerRegistry, Tile, detonate,
};
use crate::use_cases::types::{GameEvent, Outbound, PlayerSnapshot, ServerEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// Grid, player table and bomb table as one exclusively-owned aggregate.
/// All mutation goes through `apply`.
pub struct GameWorld {
    grid: Grid,
    players: PlayerRegistry,
    bombs: BombTable,
    rng: StdRng,
    map_tuning: MapTuning,
    player_tuning: PlayerTuning,
    bomb_tuning: BombTuning,
    /// Cells whose fuse still needs arming; drained by the world task.
    pending_fuses: Vec<Cell>,
}

impl GameWorld {
    pub fn new() -> Self {
        Self::with_tuning(
            StdRng::from_os_rng(),
            MapTuning::default(),
            PlayerTuning::default(),
            BombTuning::default(),
        )
    }

    pub fn with_tuning(
        mut rng: StdRng,
        map_tuning: MapTuning,
        player_tuning: PlayerTuning,
        bomb_tuning: BombTuning,
    ) -> Self {
        let grid = Grid::generate(&mut rng, &map_tuning);
        Self {
            grid,
            players: PlayerRegistry::default(),
            bombs: BombTable::default(),
            rng,
            map_tuning,
            player_tuning,
            bomb_tuning,
            pending_fuses: Vec::new(),
        }
    }

    pub fn fuse_duration(&self) -> Duration {
        self.bomb_tuning.fuse
    }

    /// Bombs placed by the last `apply` call that still need a fuse timer.
    pub fn take_pending_fuses(&mut self) -> Vec<Cell> {
        std::mem::take(&mut self.pending_fuses)
    }

    /// Applies one event and returns the outbound deltas it produced, in
    /// the order clients must apply them.
    pub fn apply(&mut self, event: GameEvent) -> Vec<Outbound> {
        match event {
            GameEvent::Join { player_id } => self.handle_join(player_id),
            GameEvent::Leave { player_id } => self.handle_leave(player_id),
            GameEvent::Move {
                player_id,
                direction,
            } => self.handle_move(player_id, direction),
            GameEvent::PlaceBomb { player_id } => self.handle_place(player_id),
            GameEvent::FuseExpired { cell } => self.handle_fuse_expired(cell),
        }
    }

    fn handle_join(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        // A fresh round starts when the first player arrives. Stale fuse
        // timers find an empty bomb table and fizzle.
        if self.players.is_empty() {
            self.grid = Grid::generate(&mut self.rng, &self.map_tuning);
            self.bombs.clear();
        }

        let spawn = self.players.next_spawn();
        let player = Player::spawn(player_id, spawn, &self.player_tuning);
        let snapshot = PlayerSnapshot::from(&player);
        self.players.insert(player);
        info!(player_id, x = spawn.x, y = spawn.y, "player joined");

        let players: Vec<PlayerSnapshot> = self.players.iter().map(PlayerSnapshot::from).collect();
        vec![
            Outbound::to(
                player_id,
                ServerEvent::MapInit {
                    grid: self.grid.clone(),
                    players,
                },
            ),
            Outbound::others(player_id, ServerEvent::PlayerJoined(snapshot)),
            self.stats_event(player_id),
        ]
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        if self.players.remove(player_id).is_none() {
            return Vec::new();
        }
        info!(player_id, "player left");
        // Armed bombs stay behind; their fuses cannot be cancelled.
        vec![Outbound::all(ServerEvent::PlayerLeft { player_id })]
    }

    fn handle_move(&mut self, player_id: PlayerId, direction: Direction) -> Vec<Outbound> {
        let Some(player) = self.players.get_mut(player_id) else {
            debug!(player_id, "move intent from unknown player");
            return Vec::new();
        };

        // The sprite turns even when the step is blocked.
        player.facing = direction;

        let (dx, dy) = direction.delta();
        let target = player.cell.step(dx, dy);

        if !self.grid.is_walkable(target) {
            // Zero duration tells the mover's client to unlock input with
            // no tween; nobody else needs to hear about it.
            let cell = player.cell;
            return vec![Outbound::to(
                player_id,
                ServerEvent::PlayerMoved {
                    player_id,
                    cell,
                    direction,
                    duration_ms: 0,
                },
            )];
        }

        player.cell = target;
        let mut events = Vec::new();

        if let Some(tile) = self.grid.tile(target).filter(|t| t.is_item()) {
            let player = self
                .players
                .get_mut(player_id)
                .expect("mover still registered");
            player.apply_item(tile, &self.player_tuning);
            self.grid.set(target, Tile::Grass);
            events.push(Outbound::all(ServerEvent::TileChanged {
                cell: target,
                tile: Tile::Grass,
            }));
            events.push(self.stats_event(player_id));
        }

        // A speed pickup on this very step already shortened the interval;
        // the broadcast carries the post-pickup value.
        let duration_ms = self
            .players
            .get(player_id)
            .expect("mover still registered")
            .move_interval_ms;

        events.push(Outbound::all(ServerEvent::PlayerMoved {
            player_id,
            cell: target,
            direction,
            duration_ms,
        }));
        events
    }

    fn handle_place(&mut self, player_id: PlayerId) -> Vec<Outbound> {
        let Some(player) = self.players.get_mut(player_id) else {
            debug!(player_id, "placement intent from unknown player");
            return Vec::new();
        };

        // Capacity exhausted or standing on anything but grass (including
        // an already-placed bomb): silently ignore.
        if player.bombs_in_flight >= player.bomb_capacity
            || self.grid.tile(player.cell) != Some(Tile::Grass)
        {
            return Vec::new();
        }

        let cell = player.cell;
        player.bombs_in_flight += 1;
        self.grid.set(cell, Tile::Bomb);
        self.bombs.arm(player_id, cell, self.bomb_tuning.fuse);
        self.pending_fuses.push(cell);
        debug!(player_id, x = cell.x, y = cell.y, "bomb armed");

        vec![Outbound::all(ServerEvent::TileChanged {
            cell,
            tile: Tile::Bomb,
        })]
    }

    fn handle_fuse_expired(&mut self, cell: Cell) -> Vec<Outbound> {
        let Some(detonation) = detonate(
            cell,
            &mut self.grid,
            &mut self.bombs,
            &mut self.players,
            &mut self.rng,
            &self.map_tuning,
            &self.bomb_tuning,
        ) else {
            // Already consumed by a chain or a round reset.
            return Vec::new();
        };

        let mut events: Vec<Outbound> = detonation
            .tile_changes
            .iter()
            .map(|&(cell, tile)| Outbound::all(ServerEvent::TileChanged { cell, tile }))
            .collect();

        events.push(Outbound::all(ServerEvent::Explosion {
            affected: detonation.affected.clone(),
        }));

        // One elimination pass over the final affected set, after every
        // chained bomb has resolved.
        for victim in self.players.ids_on_cells(&detonation.affected) {
            self.players.remove(victim);
            info!(player_id = victim, "player eliminated");
            events.push(Outbound::all(ServerEvent::PlayerEliminated {
                player_id: victim,
            }));
        }

        events
    }

    fn stats_event(&self, player_id: PlayerId) -> Outbound {
        let p = self.players.get(player_id).expect("stats for live player");
        Outbound::to(
            player_id,
            ServerEvent::StatsChanged {
                bomb_capacity: p.bomb_capacity,
                blast_range: p.blast_range,
                speed_level: p.speed_level,
            },
        )
    }
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains the input channel forever, applying events one at a time and
/// broadcasting the resulting deltas. Fuse timers are detached sleeps that
/// feed `FuseExpired` back into the same input channel, which keeps every
/// mutation on this task.
pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    input_tx: mpsc::Sender<GameEvent>,
    outbound_tx: broadcast::Sender<Outbound>,
) {
    let mut world = GameWorld::new();

    while let Some(event) = input_rx.recv().await {
        for out in world.apply(event) {
            // Send fails only when no client is subscribed; deltas for an
            // empty room are safe to drop.
            let _ = outbound_tx.send(out);
        }

        let fuse = world.fuse_duration();
        for cell in world.take_pending_fuses() {
            let tx = input_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(fuse).await;
                let _ = tx.send(GameEvent::FuseExpired { cell }).await;
            });
        }
    }
}
