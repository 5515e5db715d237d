//! Wall-clock helpers

use chrono::Utc;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Engine times are wall-clock on purpose: persisted start times have
/// to stay meaningful across process restarts, which rules out
/// monotonic instants.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn now_does_not_go_backwards_in_a_tight_loop() {
        let first = now_millis();
        for _ in 0..100 {
            assert!(now_millis() >= first);
        }
    }
}
