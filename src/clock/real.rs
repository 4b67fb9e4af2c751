use super::traits::Clock;
use chrono::Utc;

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let clock = SystemClock::new();
        let before = Utc::now().timestamp();
        let observed = clock.now_secs();
        let after = Utc::now().timestamp();

        assert!(observed >= before);
        assert!(observed <= after);
    }
}
