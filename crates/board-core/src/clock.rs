//! Wall clocks used to stamp orders and decide which day is "today".

use board_types::{BoardInstant, TimeOfDay};
use chrono::{FixedOffset, Utc};
use std::sync::Mutex;

/// Source of the current day and time of day.
pub trait Clock: Send + Sync {
	fn now(&self) -> BoardInstant;
}

/// The system clock, read at a fixed offset from UTC.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
	offset: FixedOffset,
}

impl SystemClock {
	/// Returns `None` if the offset is not a valid UTC offset.
	pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
		FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
	}
}

impl Clock for SystemClock {
	fn now(&self) -> BoardInstant {
		let local = Utc::now().with_timezone(&self.offset);
		BoardInstant {
			date: local.date_naive(),
			time: TimeOfDay::truncate(local.time()),
		}
	}
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
	instant: Mutex<BoardInstant>,
}

impl FixedClock {
	pub fn new(instant: BoardInstant) -> Self {
		Self {
			instant: Mutex::new(instant),
		}
	}

	pub fn set(&self, instant: BoardInstant) {
		*self.instant.lock().unwrap_or_else(|e| e.into_inner()) = instant;
	}
}

impl Clock for FixedClock {
	fn now(&self) -> BoardInstant {
		*self.instant.lock().unwrap_or_else(|e| e.into_inner())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	#[test]
	fn test_offset_bounds() {
		assert!(SystemClock::from_offset_minutes(-360).is_some());
		assert!(SystemClock::from_offset_minutes(24 * 60).is_none());
		assert!(SystemClock::from_offset_minutes(i32::MAX).is_none());
	}

	#[test]
	fn test_fixed_clock_moves_on_set() {
		let first = BoardInstant {
			date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
			time: TimeOfDay::from_hms(9, 0, 0).unwrap(),
		};
		let clock = FixedClock::new(first);
		assert_eq!(clock.now(), first);

		let next = BoardInstant {
			date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
			time: TimeOfDay::from_hms(0, 0, 1).unwrap(),
		};
		clock.set(next);
		assert_eq!(clock.now(), next);
	}
}
