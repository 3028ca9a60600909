use std::fmt::Write;

use crate::models::{AttendanceReport, Target};
use crate::report;

const STYLE: &str = "body{font-family:sans-serif;max-width:32rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:.75rem}input{width:100%;padding:.4rem}\
.card{border-left:.4rem solid;padding:.75rem 1rem;margin-top:1.5rem;background:#f8f9fa}\
.error{color:#dc3545}.muted{color:#6c757d;font-size:.9rem}";

/// Everything the form page shows. Field values are echoed verbatim.
#[derive(Debug)]
pub struct IndexView<'a> {
    pub total: String,
    pub attended: String,
    pub target: String,
    pub report: Option<&'a AttendanceReport>,
    pub error: Option<&'a str>,
    pub share_link: Option<&'a str>,
    pub last_updated: Option<String>,
}

impl Default for IndexView<'_> {
    fn default() -> Self {
        Self {
            total: String::new(),
            attended: String::new(),
            target: Target::default().value().to_string(),
            report: None,
            error: None,
            share_link: None,
            last_updated: None,
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn open(output: &mut String, title: &str) {
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\"><head><meta charset=\"utf-8\">");
    let _ = writeln!(
        output,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    );
    let _ = writeln!(output, "<title>{}</title><style>{}</style></head><body>", title, STYLE);
}

fn close(output: &mut String) {
    let _ = writeln!(output, "</body></html>");
}

fn report_card(output: &mut String, report: &AttendanceReport) {
    let _ = writeln!(
        output,
        "<section class=\"card {}\" style=\"border-color:{}\">",
        report.status.css_class(),
        report.status.color()
    );
    let _ = writeln!(
        output,
        "<h2 style=\"color:{}\">{:.1}%</h2>",
        report.status.color(),
        report.percentage
    );
    let _ = writeln!(
        output,
        "<p>Attended {} of {} classes, absent {} (target {}).</p>",
        report.attended, report.total, report.absent, report.target
    );
    let _ = writeln!(
        output,
        "<ul><li>Classes needed: {}</li><li>Can miss: {}</li></ul>",
        report.classes_needed, report.bunk_allowed
    );
    let _ = writeln!(output, "<p>{}</p>", escape(&report::verdict(report)));
    let _ = writeln!(output, "</section>");
}

pub fn index_page(view: &IndexView<'_>) -> String {
    let mut output = String::new();
    open(&mut output, "Attendance Tracker");

    let _ = writeln!(output, "<h1>Attendance Tracker</h1>");
    if let Some(error) = view.error {
        let _ = writeln!(output, "<p class=\"error\">{}</p>", escape(error));
    }

    let _ = writeln!(output, "<form method=\"post\" action=\"/\">");
    let _ = writeln!(
        output,
        "<label>Total classes <input name=\"total\" inputmode=\"numeric\" value=\"{}\"></label>",
        escape(&view.total)
    );
    let _ = writeln!(
        output,
        "<label>Classes attended <input name=\"attended\" inputmode=\"numeric\" value=\"{}\"></label>",
        escape(&view.attended)
    );
    let _ = writeln!(
        output,
        "<label>Target % <input name=\"target\" inputmode=\"numeric\" value=\"{}\"></label>",
        escape(&view.target)
    );
    let _ = writeln!(
        output,
        "<p><button name=\"action\" value=\"calculate\">Calculate</button> \
         <button name=\"action\" value=\"generate_link\">Share link</button></p>"
    );
    let _ = writeln!(output, "</form>");
    let _ = writeln!(
        output,
        "<form method=\"post\" action=\"/clear\"><button>Clear saved data</button></form>"
    );

    if let Some(last_updated) = &view.last_updated {
        let _ = writeln!(
            output,
            "<p class=\"muted\">Last updated {}</p>",
            escape(last_updated)
        );
    }

    if let Some(report) = view.report {
        report_card(&mut output, report);
    }

    if let Some(link) = view.share_link {
        let link = escape(link);
        let _ = writeln!(
            output,
            "<p>Share: <a href=\"{link}\">{link}</a></p>"
        );
    }

    close(&mut output);
    output
}

pub fn check_page(report: Option<&AttendanceReport>) -> String {
    let mut output = String::new();
    open(&mut output, "Shared Attendance");

    let _ = writeln!(output, "<h1>Shared Attendance</h1>");
    match report {
        Some(report) => report_card(&mut output, report),
        None => {
            let _ = writeln!(output, "<p class=\"error\">Invalid link</p>");
        }
    }
    let _ = writeln!(output, "<p><a href=\"/\">Track your own attendance</a></p>");

    close(&mut output);
    output
}
