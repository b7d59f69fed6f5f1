//! Tests for `RetryPolicy`.

use super::RetryPolicy;
use std::time::Duration;

mod defaults {
    use super::*;

    #[test]
    fn new_matches_documented_defaults() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_trait_matches_new() {
        assert_eq!(RetryPolicy::default(), RetryPolicy::new());
    }
}

mod builder {
    use super::*;

    #[test]
    fn builder_chains_correctly() {
        let policy = RetryPolicy::new()
            .with_max_attempts(6)
            .with_initial_delay(Duration::from_millis(50))
            .with_max_delay(Duration::from_secs(2))
            .with_multiplier(3.0);

        assert_eq!(policy.max_attempts, 6);
        assert_eq!(policy.initial_delay, Duration::from_millis(50));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
        assert!((policy.multiplier - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    #[should_panic(expected = "max_attempts must be at least 1")]
    fn zero_attempts_panics() {
        let _ = RetryPolicy::new().with_max_attempts(0);
    }

    #[test]
    #[should_panic(expected = "multiplier must be positive")]
    fn non_positive_multiplier_panics() {
        let _ = RetryPolicy::new().with_multiplier(0.0);
    }
}

mod delay_for_retry {
    use super::*;

    #[test]
    fn grows_exponentially() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(200));
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(400));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(800));
    }

    #[test]
    fn capped_at_max_delay() {
        let policy = RetryPolicy::new().with_max_delay(Duration::from_millis(500));

        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for_retry(30), Duration::from_millis(500));
    }

    #[test]
    fn zero_initial_delay_stays_zero() {
        let policy = RetryPolicy::new().with_initial_delay(Duration::ZERO);

        assert_eq!(policy.delay_for_retry(4), Duration::ZERO);
    }
}

mod delays {
    use super::*;

    #[test]
    fn one_fewer_than_attempts() {
        let delays: Vec<_> = RetryPolicy::new().delays().collect();

        assert_eq!(delays, [Duration::from_millis(200), Duration::from_millis(400)]);
    }

    #[test]
    fn single_attempt_has_no_delays() {
        assert_eq!(RetryPolicy::new().with_max_attempts(1).delays().count(), 0);
    }

    #[test]
    fn huge_retry_counts_saturate_at_cap() {
        let policy = RetryPolicy::new().with_max_delay(Duration::from_secs(1));

        assert_eq!(policy.delay_for_retry(u32::MAX), Duration::from_secs(1));
    }
}
