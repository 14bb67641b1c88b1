use std::fmt::Write as _;

use crate::api::types::{Summary, SummaryItem};
use crate::calendar::{self, CalendarDate, DateRange, RangeError};

/// Reporting window choice on the summary screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryMode {
    Week,
    Month,
    Range { from: String, to: String },
}

impl SummaryMode {
    /// Week and month are taken around `today`; a custom range must be two
    /// valid dates in order.
    pub fn resolve(&self, today: CalendarDate) -> Result<DateRange, RangeError> {
        match self {
            SummaryMode::Week  => Ok(calendar::current_week_range(today)),
            SummaryMode::Month => Ok(calendar::current_month_range(today).range),
            SummaryMode::Range { from, to } => DateRange::parse(from, to),
        }
    }
}

/// `95` → `"1h 35m"`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn section(out: &mut String, title: &str, items: &[SummaryItem], label: impl Fn(&SummaryItem) -> String) {
    let _ = writeln!(out, "\n{title}");
    if items.is_empty() {
        let _ = writeln!(out, "  no data");
        return;
    }
    let rows: Vec<(String, String)> = items.iter()
        .map(|i| (label(i), format_minutes(i.minutes)))
        .collect();
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (l, m) in rows {
        let _ = writeln!(out, "  {l:<width$}  {m:>8}");
    }
}

pub fn render(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Period: {} .. {}", summary.from, summary.to);
    let _ = writeln!(out, "Total:  {}", format_minutes(summary.total_minutes));

    section(&mut out, "By subject", &summary.by_subject, |i| {
        i.subject.clone().unwrap_or_else(|| "unknown".into())
    });
    section(&mut out, "By task", &summary.by_task, |i| {
        i.name.clone().or_else(|| i.task_id.clone()).unwrap_or_else(|| "unknown".into())
    });
    section(&mut out, "By day", &summary.by_day, |i| {
        i.date.map(|d| d.to_string()).unwrap_or_else(|| "unknown".into())
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m0: u32, day: u32) -> CalendarDate {
        CalendarDate::new(y, m0, day).unwrap()
    }

    fn item(minutes: u32) -> SummaryItem {
        SummaryItem { minutes, subject: None, name: None, task_id: None, date: None }
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_minutes(0), "0h 0m");
        assert_eq!(format_minutes(95), "1h 35m");
        assert_eq!(format_minutes(120), "2h 0m");
    }

    #[test]
    fn modes_resolve_around_today() {
        let today = d(2024, 1, 14);
        let week = SummaryMode::Week.resolve(today).unwrap();
        assert_eq!((week.from(), week.to()), (d(2024, 1, 12), d(2024, 1, 18)));
        let month = SummaryMode::Month.resolve(today).unwrap();
        assert_eq!((month.from(), month.to()), (d(2024, 1, 1), d(2024, 1, 29)));
    }

    #[test]
    fn reversed_custom_range_is_refused() {
        let mode = SummaryMode::Range { from: "2024-03-10".into(), to: "2024-03-01".into() };
        assert!(matches!(mode.resolve(d(2024, 2, 1)), Err(RangeError::Reversed { .. })));
    }

    #[test]
    fn render_labels_fall_back() {
        let summary = Summary {
            from: d(2024, 2, 11), to: d(2024, 2, 17), total_minutes: 75,
            by_day: vec![],
            by_subject: vec![SummaryItem { subject: Some("Math".into()), ..item(75) }],
            by_task: vec![SummaryItem { task_id: Some("t9".into()), ..item(45) }, item(30)],
        };
        let text = render(&summary);
        assert!(text.contains("Period: 2024-03-11 .. 2024-03-17"));
        assert!(text.contains("Total:  1h 15m"));
        assert!(text.contains("Math"));
        assert!(text.contains("t9"));
        assert!(text.contains("unknown"));
        assert!(text.contains("By day\n  no data"));
    }
}
