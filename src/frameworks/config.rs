use std::env;

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("BLASTGRID_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
// Deltas are small; the budget covers a burst of chain detonations before a
// slow client gets disconnected for lagging.
pub const OUTBOUND_BROADCAST_CAPACITY: usize = 256;
