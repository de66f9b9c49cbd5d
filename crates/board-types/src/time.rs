//! Wall-clock stamps used by orders.
//!
//! Orders carry a calendar date (the grouping key) and several time-of-day
//! stamps. Stamps are stored as zero-padded `HH:MM:SS` strings so that the
//! lexicographic order of the stored text matches chronological order.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const TIME_FORMAT: &str = "%H:%M:%S";

/// A time-of-day stamp with second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
	/// Builds a stamp from hour, minute and second, returning `None` when out of range.
	pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
		NaiveTime::from_hms_opt(hour, minute, second).map(Self)
	}

	/// Drops any sub-second component of `time`.
	pub fn truncate(time: NaiveTime) -> Self {
		Self(time.with_nanosecond(0).unwrap_or(time))
	}

	pub fn as_naive(&self) -> NaiveTime {
		self.0
	}
}

impl fmt::Display for TimeOfDay {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.format(TIME_FORMAT))
	}
}

impl FromStr for TimeOfDay {
	type Err = chrono::ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		NaiveTime::parse_from_str(s, TIME_FORMAT).map(Self)
	}
}

impl Serialize for TimeOfDay {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for TimeOfDay {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// A single reading of the board clock: the calendar day and the time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardInstant {
	pub date: NaiveDate,
	pub time: TimeOfDay,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_is_zero_padded() {
		let stamp = TimeOfDay::from_hms(9, 5, 0).unwrap();
		assert_eq!(stamp.to_string(), "09:05:00");
	}

	#[test]
	fn test_truncate_drops_fraction() {
		let time = NaiveTime::from_hms_milli_opt(13, 4, 59, 750).unwrap();
		assert_eq!(TimeOfDay::truncate(time).to_string(), "13:04:59");
	}

	#[test]
	fn test_ordering_matches_text_ordering() {
		let earlier: TimeOfDay = "09:00:00".parse().unwrap();
		let later: TimeOfDay = "10:00:00".parse().unwrap();
		assert!(earlier < later);
		assert!(earlier.to_string() < later.to_string());
	}

	#[test]
	fn test_rejects_malformed_text() {
		assert!("9am".parse::<TimeOfDay>().is_err());
		assert!(serde_json::from_str::<TimeOfDay>("\"25:00:00\"").is_err());
	}
}
