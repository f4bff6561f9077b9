//! Terminal output: coloured notes and the end-of-run summary table.

use coursepace_config::ValidationReport;
use coursepace_core::TimerStatus;
use coursepace_scheduler::RunReport;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}i{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}!{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}x{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}ok{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

/// Print every warning and error of a config check.
pub fn print_validation(report: &ValidationReport) {
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
}

enum Align {
    Left,
    Right,
}

struct Column {
    header: &'static str,
    align: Align,
}

impl Column {
    fn left(header: &'static str) -> Self {
        Self { header, align: Align::Left }
    }

    fn right(header: &'static str) -> Self {
        Self { header, align: Align::Right }
    }
}

fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(strip_ansi(cell).chars().count());
        }
    }

    let render_row = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(columns)
            .zip(&widths)
            .map(|((cell, col), width)| pad_cell(cell, *width, &col.align))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = render_row(columns.iter().map(|c| c.header.to_string()).collect());
    out.push_str(&render_row(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        out.push_str(&render_row(row.clone()));
    }
    out
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = width.saturating_sub(strip_ansi(s).chars().count());
    match align {
        Align::Left => format!("{s}{}", " ".repeat(pad)),
        Align::Right => format!("{}{s}", " ".repeat(pad)),
    }
}

fn format_duration(seconds: u64) -> String {
    format!("{}m{:02}s", seconds / 60, seconds % 60)
}

/// Per-course table followed by the run totals.
pub fn render_report(report: &RunReport) -> String {
    let columns = [
        Column::left("Course"),
        Column::left("Status"),
        Column::right("Credited"),
        Column::right("Required"),
        Column::right("Ticks"),
        Column::left("Last error"),
    ];
    let rows: Vec<Vec<String>> = report
        .courses
        .values()
        .map(|course| {
            vec![
                course.title.clone().unwrap_or_else(|| course.course_id.clone()),
                course.status.to_string(),
                format_duration(course.cumulative_submitted_seconds),
                format_duration(course.required_seconds),
                course.ticks.to_string(),
                course.last_error.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut out = render_table(&columns, &rows);
    let pending = report
        .courses
        .values()
        .filter(|c| c.status == TimerStatus::Pending)
        .count();
    out.push_str(&format!(
        "\n  {} completed, {} failed, {} unfinished ({} never started); {} credited{}\n",
        report.completed_count(),
        report.failed_count(),
        report.unfinished_count(),
        pending,
        format_duration(report.total_submitted_seconds()),
        if report.cancelled { ", run cancelled" } else { "" },
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursepace_scheduler::CourseSummary;
    use uuid::Uuid;

    fn summary(id: &str, status: TimerStatus, credited: u64, required: u64) -> CourseSummary {
        CourseSummary {
            course_id: id.into(),
            title: None,
            status,
            cumulative_submitted_seconds: credited,
            required_seconds: required,
            ticks: 3,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration(150), "2m30s");
        assert_eq!(format_duration(59), "0m59s");
    }

    #[test]
    fn report_lists_courses_and_totals() {
        let mut report = RunReport::new(Uuid::nil());
        report.record(summary("c-1", TimerStatus::Completed, 150, 150));
        report.record(summary("c-2", TimerStatus::Pending, 0, 600));
        report.cancelled = true;

        let text = render_report(&report);
        assert!(text.contains("c-1"));
        assert!(text.contains("completed"));
        assert!(text.contains("2m30s"));
        assert!(text.contains("1 completed, 0 failed, 1 unfinished (1 never started)"));
        assert!(text.ends_with(", run cancelled\n"));
    }
}
