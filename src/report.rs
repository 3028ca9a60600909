use std::fmt::Write;

use crate::models::AttendanceReport;

pub fn verdict(report: &AttendanceReport) -> String {
    if report.classes_needed > 0 {
        format!(
            "Attend the next {} classes to reach {}.",
            report.classes_needed, report.target
        )
    } else if report.bunk_allowed > 0 {
        format!(
            "You can miss {} more classes and stay at or above {}.",
            report.bunk_allowed, report.target
        )
    } else if 100 * u64::from(report.attended)
        == u64::from(report.target.value()) * u64::from(report.total)
    {
        format!("You are exactly on {}; do not miss the next class.", report.target)
    } else {
        format!(
            "You are above {} but cannot miss the next class.",
            report.target
        )
    }
}

pub fn build_report(report: &AttendanceReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(
        output,
        "{:.1}% attended ({}) against a {} target",
        report.percentage,
        report.status.css_class(),
        report.target
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "- Total classes: {}", report.total);
    let _ = writeln!(output, "- Attended: {}", report.attended);
    let _ = writeln!(output, "- Absent: {}", report.absent);
    let _ = writeln!(output, "- Classes needed: {}", report.classes_needed);
    let _ = writeln!(output, "- Can miss: {}", report.bunk_allowed);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", verdict(report));

    output
}
