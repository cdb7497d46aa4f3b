use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns a process-unique player id for a new connection.
///
/// A counter seeded from the boot timestamp keeps ids unique across the
/// process lifetime and unlikely to repeat across restarts, so a late
/// intent from a dropped connection never matches a fresh player.
pub fn next_player_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| {
        let boot = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        AtomicU64::new(boot)
    });
    counter.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = next_player_id();
        let b = next_player_id();
        assert!(b > a);
    }
}
