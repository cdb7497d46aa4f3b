use crate::use_cases::{GameEvent, Outbound};
use tokio::sync::{broadcast, mpsc};

#[derive(Clone)]
pub struct AppState {
    // Intents flowing from connections into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    // State deltas produced by the world task, fanned out to every
    // connection in engine order.
    pub outbound_tx: broadcast::Sender<Outbound>,
}
