use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// The current wall-clock time in UTC.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// A time measurement pairing a wall-clock start with a monotonic elapsed
/// duration.
///
/// The wall clock gives the human-meaningful start timestamp; the
/// monotonic timer makes the measured duration immune to wall-clock
/// adjustments.
#[derive(Debug, Clone, Copy)]
pub struct TimeMeasurement {
    start_time: DateTime<Utc>,
    started: Instant,
}

impl TimeMeasurement {
    /// Starts a new measurement now.
    pub fn start() -> TimeMeasurement {
        TimeMeasurement {
            start_time: now_utc(),
            started: Instant::now(),
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// The monotonic time elapsed since the measurement started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let measurement = TimeMeasurement::start();
        let first = measurement.elapsed();
        let second = measurement.elapsed();
        assert!(second >= first);
    }
}
