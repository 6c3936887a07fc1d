use rand::{rng, Rng};
use tokio::time::{self, Duration};

/// Randomized pause issued before each remote query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    min: Duration,
    max: Duration,
}

impl Throttle {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Throttle { min: max, max: min }
        } else {
            Throttle { min, max }
        }
    }

    pub fn disabled() -> Self {
        Throttle::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn next_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rng().random_range(self.min..=self.max)
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::info!("Waiting {:.2} seconds...", delay.as_secs_f64());
        time::sleep(delay).await;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Throttle::new(Duration::from_secs(5), Duration::from_secs(15))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_delay_within_bounds() {
        let throttle = Throttle::default();
        for _ in 0..100 {
            let delay = throttle.next_delay();
            assert!(delay >= Duration::from_secs(5));
            assert!(delay <= Duration::from_secs(15));
        }
    }

    #[test]
    fn test_swapped_bounds() {
        let throttle = Throttle::new(Duration::from_secs(3), Duration::from_secs(1));
        assert_eq!(
            throttle,
            Throttle::new(Duration::from_secs(1), Duration::from_secs(3))
        );
    }

    #[test]
    fn test_fixed_delay() {
        let throttle = Throttle::new(Duration::from_secs(2), Duration::from_secs(2));
        assert_eq!(throttle.next_delay(), Duration::from_secs(2));
        assert_eq!(Throttle::disabled().next_delay(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_for_the_delay() {
        let throttle = Throttle::new(Duration::from_secs(5), Duration::from_secs(15));
        let before = Instant::now();
        throttle.wait().await;
        let elapsed = before.elapsed();

        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed <= Duration::from_secs(16));
    }
}
