use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TARGET: u8 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Enter positive numbers")]
    Negative,
    #[error("Enter a smaller number")]
    TooLarge,
    #[error("Attended cannot exceed total")]
    AttendedExceedsTotal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("Target must be between 1 and 99 percent (got {0})")]
    OutOfRange(i64),
}

/// Raw attendance counts. `attended <= total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceRecord {
    total: u32,
    attended: u32,
}

impl AttendanceRecord {
    pub fn new(total: i64, attended: i64) -> Result<Self, RecordError> {
        if total < 0 || attended < 0 {
            return Err(RecordError::Negative);
        }
        let total = u32::try_from(total).map_err(|_| RecordError::TooLarge)?;
        let attended = u32::try_from(attended).map_err(|_| RecordError::TooLarge)?;
        if attended > total {
            return Err(RecordError::AttendedExceedsTotal);
        }
        Ok(Self { total, attended })
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn attended(&self) -> u32 {
        self.attended
    }

    pub fn absent(&self) -> u32 {
        self.total - self.attended
    }
}

/// Target attendance percentage.
///
/// Only `1..=99` is accepted: at 0 the allowance to miss classes is unbounded
/// and at 100 no number of further classes can recover a single absence, so
/// both ends are refused as configuration errors instead of producing a
/// division by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Target(u8);

impl Target {
    pub fn new(percent: i64) -> Result<Self, TargetError> {
        match u8::try_from(percent) {
            Ok(value @ 1..=99) => Ok(Self(value)),
            _ => Err(TargetError::OutOfRange(percent)),
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Target {
    fn default() -> Self {
        Self(DEFAULT_TARGET)
    }
}

impl TryFrom<i64> for Target {
    type Error = TargetError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Target> for u8 {
    fn from(target: Target) -> Self {
        target.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl Status {
    pub fn css_class(&self) -> &'static str {
        match self {
            Status::Excellent => "excellent",
            Status::Good => "good",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Status::Excellent => "#28a745",
            Status::Good => "#17a2b8",
            Status::Warning => "#ffc107",
            Status::Critical => "#dc3545",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub total: u32,
    pub attended: u32,
    pub absent: u32,
    pub target: Target,
    /// Rounded to one decimal place, half to even.
    pub percentage: f64,
    pub classes_needed: u64,
    pub bunk_allowed: u64,
    pub status: Status,
}

/// The last record entered through the form, as persisted between visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecord {
    pub total: u32,
    pub attended: u32,
    #[serde(default)]
    pub target: Target,
    #[serde(with = "timestamp")]
    pub last_updated: NaiveDateTime,
}

impl SavedRecord {
    pub fn new(record: AttendanceRecord, target: Target, last_updated: NaiveDateTime) -> Self {
        Self {
            total: record.total(),
            attended: record.attended(),
            target,
            last_updated,
        }
    }

    pub fn record(&self) -> Result<AttendanceRecord, RecordError> {
        AttendanceRecord::new(i64::from(self.total), i64::from(self.attended))
    }

    pub fn last_updated_label(&self) -> String {
        self.last_updated.format(timestamp::FORMAT).to_string()
    }
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 2)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap()
    }

    #[test]
    fn record_rejects_invalid_counts() {
        assert_eq!(AttendanceRecord::new(-1, 0), Err(RecordError::Negative));
        assert_eq!(AttendanceRecord::new(10, -3), Err(RecordError::Negative));
        assert_eq!(
            AttendanceRecord::new(5, 6),
            Err(RecordError::AttendedExceedsTotal)
        );
        assert_eq!(
            AttendanceRecord::new(i64::from(u32::MAX) + 1, 0),
            Err(RecordError::TooLarge)
        );
    }

    #[test]
    fn record_exposes_counts() {
        let record = AttendanceRecord::new(40, 31).unwrap();
        assert_eq!(record.total(), 40);
        assert_eq!(record.attended(), 31);
        assert_eq!(record.absent(), 9);
        assert!(AttendanceRecord::new(0, 0).is_ok());
    }

    #[test]
    fn target_accepts_only_open_percentage_range() {
        assert_eq!(Target::new(0), Err(TargetError::OutOfRange(0)));
        assert_eq!(Target::new(100), Err(TargetError::OutOfRange(100)));
        assert_eq!(Target::new(-20), Err(TargetError::OutOfRange(-20)));
        assert_eq!(Target::new(1).unwrap().value(), 1);
        assert_eq!(Target::new(99).unwrap().value(), 99);
        assert_eq!(Target::default().value(), 80);
        assert_eq!(Target::new(75).unwrap().to_string(), "75%");
    }

    #[test]
    fn saved_record_uses_plain_timestamp_format() {
        let saved = SavedRecord::new(
            AttendanceRecord::new(20, 17).unwrap(),
            Target::new(75).unwrap(),
            sample_time(),
        );
        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json["last_updated"], "2026-02-02 09:30:00");
        assert_eq!(json["target"], 75);
        assert_eq!(saved.last_updated_label(), "2026-02-02 09:30:00");
    }

    #[test]
    fn saved_record_without_target_defaults_to_eighty() {
        let raw = r#"{"total": 12, "attended": 9, "last_updated": "2026-01-30 18:04:11"}"#;
        let saved: SavedRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(saved.target, Target::default());
        assert_eq!(saved.record().unwrap().absent(), 3);
    }

    #[test]
    fn saved_record_rejects_out_of_range_target() {
        let raw = r#"{"total": 12, "attended": 9, "target": 100, "last_updated": "2026-01-30 18:04:11"}"#;
        assert!(serde_json::from_str::<SavedRecord>(raw).is_err());
    }

    #[test]
    fn status_maps_to_display_values() {
        assert_eq!(Status::Excellent.color(), "#28a745");
        assert_eq!(Status::Critical.css_class(), "critical");
        assert_eq!(serde_json::to_value(Status::Warning).unwrap(), "warning");
    }
}
