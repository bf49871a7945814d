use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::time::now_utc;

/// Schedule construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("`interval` must be positive")]
    NonPositiveInterval,

    #[error("`start_time` must not be after `end_time`")]
    InvalidRange,

    #[error("`num_repeat` must be at least 1")]
    ZeroRepeats,
}

/// A rule determining when a query is to be executed.
///
/// Conceptually similar to a cron expression, but simpler, which is all a
/// database workload needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Once(Once),
    Repeat(Repeat),
}

impl Schedule {
    /// The remaining time until the schedule next fires. Negative when the
    /// last event is already in the past.
    pub fn time_until_next(&self) -> Duration {
        match self {
            Schedule::Once(once) => once.time_until_next(),
            Schedule::Repeat(repeat) => repeat.time_until_next(),
        }
    }

    /// A one-shot schedule at the given time.
    pub fn once(at: DateTime<Utc>) -> Schedule {
        Schedule::Once(Once { at })
    }

    /// A one-shot schedule at the current time.
    pub fn once_now() -> Schedule {
        Schedule::Once(Once::now())
    }
}

/// Schedules an event at one particular time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Once {
    pub at: DateTime<Utc>,
}

impl Once {
    pub fn new(at: DateTime<Utc>) -> Once {
        Once { at }
    }

    /// A `Once` at the current time; later calls to `time_until_next`
    /// will return zero or less.
    pub fn now() -> Once {
        Once { at: now_utc() }
    }

    pub fn time_until_next(&self) -> Duration {
        self.at - now_utc()
    }
}

/// Schedules an event to repeat every `interval`, from `start_time` until
/// `end_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    interval: Duration,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl Repeat {
    pub fn new(
        interval: Duration,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Repeat, ScheduleError> {
        if interval <= Duration::zero() {
            return Err(ScheduleError::NonPositiveInterval);
        }
        if start_time > end_time {
            return Err(ScheduleError::InvalidRange);
        }
        Ok(Repeat {
            interval,
            start_time,
            end_time,
        })
    }

    /// A repeat starting now and ending after `num_repeat` occurrences.
    pub fn starting_now(interval: Duration, num_repeat: u32) -> Result<Repeat, ScheduleError> {
        if num_repeat < 1 {
            return Err(ScheduleError::ZeroRepeats);
        }
        let start_time = now_utc();
        Repeat::new(
            interval,
            start_time,
            start_time + interval * num_repeat as i32,
        )
    }

    /// A repeat starting now and ending at `end_time`.
    pub fn starting_now_until(
        interval: Duration,
        end_time: DateTime<Utc>,
    ) -> Result<Repeat, ScheduleError> {
        Repeat::new(interval, now_utc(), end_time)
    }

    /// An unbounded repeat starting now.
    pub fn starting_now_forever(interval: Duration) -> Result<Repeat, ScheduleError> {
        Repeat::new(interval, now_utc(), DateTime::<Utc>::MAX_UTC)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn time_until_next(&self) -> Duration {
        let current_time = now_utc();

        // Case 1: the schedule has not started yet
        if current_time <= self.start_time {
            return self.start_time - current_time;
        }

        // Case 2: the schedule has ended
        if current_time > self.end_time {
            return self.end_time - current_time;
        }

        // Case 3: the schedule is in progress. The elapsed span is small
        // enough for nanosecond arithmetic (no i64 overflow) in practice.
        let elapsed = current_time - self.start_time;
        let elapsed_nanos = elapsed.num_nanoseconds().unwrap_or(i64::MAX);
        let interval_nanos = self
            .interval
            .num_nanoseconds()
            .unwrap_or(i64::MAX);

        let since_last = elapsed_nanos % interval_nanos;
        let until_next = (interval_nanos - since_last) % interval_nanos;

        Duration::nanoseconds(until_next).min(self.end_time - current_time)
    }
}
