//! Broadcast request sizing for `sgf-notify`

use std::time::Duration;

/// Fixed allowance for connecting and reading the summary
const BASE_TIMEOUT: Duration = Duration::from_secs(30);

/// Expected delivery time of one message, on top of the pacing interval
const PER_SEND: Duration = Duration::from_secs(1);

/// Time to wait for the bot to answer a broadcast of `recipients` messages
///
/// The bot sends one message per `pacing` interval and only answers once
/// every send has finished, so the wait grows with both.
pub fn broadcast_timeout(recipients: usize, pacing: Duration) -> Duration {
    let recipients = u32::try_from(recipients).unwrap_or(u32::MAX);
    BASE_TIMEOUT.saturating_add((pacing.saturating_add(PER_SEND)).saturating_mul(recipients))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_covers_paced_sends() {
        let pacing = Duration::from_millis(100);
        assert_eq!(broadcast_timeout(0, pacing), Duration::from_secs(30));
        assert_eq!(broadcast_timeout(10, pacing), Duration::from_secs(41));

        // 200 recipients 2 s apart
        let slow = broadcast_timeout(200, Duration::from_secs(2));
        assert!(slow >= Duration::from_secs(2) * 200 + Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_saturates() {
        assert_eq!(broadcast_timeout(usize::MAX, Duration::MAX), Duration::MAX);
    }
}
