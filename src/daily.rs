//! Daily checklist state and the month calendar shown beside it.

use std::collections::HashMap;

use crate::api::types::{CalendarDay, DailyItem, DailySave, DailyTask, DailyView};
use crate::calendar::{self, CalendarDate, MonthGridCell, DAY_LABELS};

// ─── Selected day ─────────────────────────────────────────────────────────────

/// Date requested on the command line, falling back to `today` when absent
/// or unparseable.
pub fn selected_date(requested: Option<&str>, today: CalendarDate) -> CalendarDate {
    match requested.map(calendar::parse) {
        Some(Ok(date)) => date,
        Some(Err(e)) => {
            tracing::warn!("{e}; showing {today} instead");
            today
        }
        None => today,
    }
}

// ─── Checklist ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistEntry {
    pub task:    DailyTask,
    pub checked: bool,
}

#[derive(Debug, Clone)]
pub struct DailyChecklist {
    pub date:    CalendarDate,
    pub entries: Vec<ChecklistEntry>,
}

impl DailyChecklist {
    pub fn new(date: CalendarDate, view: DailyView) -> Self {
        let entries = view.tasks.into_iter()
            .map(|task| ChecklistEntry { checked: task.is_done, task })
            .collect();
        Self { date, entries }
    }

    fn entry_mut(&mut self, task_id: &str) -> Option<&mut ChecklistEntry> {
        self.entries.iter_mut().find(|e| e.task.task_id == task_id)
    }

    /// Returns false if no entry has this id.
    pub fn set_checked(&mut self, task_id: &str, checked: bool) -> bool {
        self.entry_mut(task_id).map(|e| e.checked = checked).is_some()
    }

    pub fn set_minutes(&mut self, task_id: &str, minutes: u32) -> bool {
        self.entry_mut(task_id).map(|e| e.task.minutes = minutes).is_some()
    }

    /// Only checked entries are sent; the API treats the rest as not done.
    pub fn save_payload(&self) -> DailySave {
        DailySave {
            items: self.entries.iter()
                .filter(|e| e.checked)
                .map(|e| DailyItem { task_id: e.task.task_id.clone(), minutes: e.task.minutes })
                .collect(),
        }
    }

    pub fn checked_minutes(&self) -> u32 {
        self.entries.iter().filter(|e| e.checked).map(|e| e.task.minutes).sum()
    }
}

// ─── Calendar heat-map ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    NoTasks,
    NoneDone,
    Partial,
    AllDone,
}

impl Completion {
    pub fn of(day: &CalendarDay) -> Self {
        match (day.total, day.done) {
            (0, _)                 => Completion::NoTasks,
            (_, 0)                 => Completion::NoneDone,
            (t, d) if d >= t       => Completion::AllDone,
            _                      => Completion::Partial,
        }
    }

    pub fn marker(self) -> char {
        match self {
            Completion::NoTasks  => ' ',
            Completion::NoneDone => '.',
            Completion::Partial  => '+',
            Completion::AllDone  => '#',
        }
    }
}

/// Text month calendar, Sunday-first. Each day shows its completion marker;
/// the selected day is bracketed.
pub fn render_month(year: i32, month0: u32, days: &[CalendarDay], selected: CalendarDate) -> String {
    let status: HashMap<CalendarDate, Completion> =
        days.iter().map(|d| (d.date, Completion::of(d))).collect();

    let mut out = String::new();
    out.push_str(&format!("{:^35}\n", format!("{year}-{:02}", month0 + 1)));
    for label in DAY_LABELS {
        out.push_str(&format!(" {label:<4}"));
    }
    out.push('\n');

    let mut cells: Vec<String> = calendar::month_grid(year, month0).into_iter()
        .map(|cell| match cell {
            MonthGridCell::Blank => "     ".to_owned(),
            MonthGridCell::Day(date) => {
                let mark = status.get(&date).copied().unwrap_or(Completion::NoTasks).marker();
                if date == selected {
                    format!("[{:>2}{mark}]", date.day())
                } else {
                    format!(" {:>2}{mark} ", date.day())
                }
            }
        })
        .collect();
    while cells.len() % 7 != 0 {
        cells.push("     ".to_owned());
    }
    for week in cells.chunks(7) {
        out.push_str(week.concat().trim_end());
        out.push('\n');
    }
    out
}
