use std::cmp::Ordering;

use crate::models::{AttendanceRecord, AttendanceReport, Status, Target};

/// Derives the attendance report for `record` against `target`.
///
/// Returns `None` when no classes have been recorded. Every comparison is
/// made on exact integers, so a record sitting exactly on a boundary is
/// classified the same way regardless of floating-point rounding.
pub fn calculate(record: &AttendanceRecord, target: Target) -> Option<AttendanceReport> {
    let total = u64::from(record.total());
    if total == 0 {
        return None;
    }
    let attended = u64::from(record.attended());
    let pct = u64::from(target.value());

    let on_target = 100 * attended >= pct * total;
    let classes_needed = if on_target {
        0
    } else {
        classes_needed(total, attended, pct)
    };
    let bunk_allowed = if on_target {
        bunk_allowed(total, attended, pct)
    } else {
        0
    };

    Some(AttendanceReport {
        total: record.total(),
        attended: record.attended(),
        absent: record.absent(),
        target,
        percentage: rounded_percentage(total, attended),
        classes_needed,
        bunk_allowed,
        status: classify(total, attended, pct),
    })
}

// Smallest n with (attended + n) / (total + n) >= pct / 100.
// Caller guarantees 100 * attended < pct * total and pct < 100.
fn classes_needed(total: u64, attended: u64, pct: u64) -> u64 {
    (pct * total - 100 * attended).div_ceil(100 - pct)
}

// Largest m with attended / (total + m) >= pct / 100.
// Caller guarantees 100 * attended >= pct * total and pct > 0.
fn bunk_allowed(total: u64, attended: u64, pct: u64) -> u64 {
    (100 * attended - pct * total) / pct
}

/// `attended / total * 100` to one decimal place, ties to even.
pub fn rounded_percentage(total: u64, attended: u64) -> f64 {
    let scaled = attended * 1000;
    let mut tenths = scaled / total;
    let remainder = scaled % total;
    match (2 * remainder).cmp(&total) {
        Ordering::Greater => tenths += 1,
        Ordering::Equal if tenths % 2 == 1 => tenths += 1,
        _ => {}
    }
    tenths as f64 / 10.0
}

fn classify(total: u64, attended: u64, pct: u64) -> Status {
    let achieved = 100 * attended as i64;
    let at_least = |offset: i64| achieved >= (pct as i64 - offset) * total as i64;

    if at_least(0) {
        Status::Excellent
    } else if at_least(20) {
        Status::Good
    } else if at_least(40) {
        Status::Warning
    } else {
        Status::Critical
    }
}
