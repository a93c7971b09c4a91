use rand::Rng;
use std::time::Duration;

/// Jittered exponential backoff for saga step retries (spec.md §4.4
/// `CREATED → RESERVED`: "on transient error retry with jittered
/// exponential backoff up to a configured cap").
///
/// `attempt` is zero-based. Base delay doubles each attempt, capped at 5 s,
/// then a random jitter in `[0, base)` is added (full jitter) so retrying
/// callers don't resynchronize after a shared outage.
pub fn delay_for_attempt(attempt: u32) -> Duration {
    const BASE_MS: u64 = 50;
    const CAP_MS: u64 = 5_000;

    let exp_ms = BASE_MS.saturating_mul(1u64 << attempt.min(20));
    let capped_ms = exp_ms.min(CAP_MS);
    let jittered_ms = rand::thread_rng().gen_range(0..=capped_ms);
    Duration::from_millis(jittered_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_never_exceeds_the_cap() {
        for attempt in 0..30 {
            assert!(delay_for_attempt(attempt) <= Duration::from_millis(5_000));
        }
    }

    #[test]
    fn delay_is_zero_or_more_and_bounded_by_exponential_growth() {
        // attempt 0's full-jitter range is [0, 50ms); well below the cap.
        let d = delay_for_attempt(0);
        assert!(d <= Duration::from_millis(50));
    }
}
