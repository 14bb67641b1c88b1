use thiserror::Error;

use crate::api::types::{Task, TaskPayload};
use crate::calendar::{CalendarDate, WeekdayMask};

pub const DEFAULT_MINUTES: &str = "30";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFormError {
    #[error("name is required")]
    NameRequired,
    #[error("subject is required")]
    SubjectRequired,
    #[error("select at least one weekday")]
    NoWeekday,
    #[error("default minutes must be a whole number of minutes, got {0:?}")]
    InvalidMinutes(String),
}

/// Editor state for creating or editing a recurring task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub name:            String,
    pub subject:         String,
    pub description:     String,
    pub default_minutes: String,
    pub days:            [bool; 7],
    pub is_archived:     bool,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            name:            String::new(),
            subject:         String::new(),
            description:     String::new(),
            default_minutes: DEFAULT_MINUTES.to_owned(),
            days:            [false; 7],
            is_archived:     false,
        }
    }
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            name:            task.name.clone(),
            subject:         task.subject.clone(),
            description:     task.description.clone().unwrap_or_default(),
            default_minutes: task.default_minutes.to_string(),
            days:            task.days_mask.decode(),
            is_archived:     task.is_archived,
        }
    }

    pub fn toggle_day(&mut self, weekday: usize) {
        if let Some(d) = self.days.get_mut(weekday) {
            *d = !*d;
        }
    }

    /// Checks run in the order the editor reports them.
    pub fn validate(&self) -> Result<TaskPayload, TaskFormError> {
        let name = self.name.trim();
        if name.is_empty() { return Err(TaskFormError::NameRequired); }
        let subject = self.subject.trim();
        if subject.is_empty() { return Err(TaskFormError::SubjectRequired); }

        let days_mask = WeekdayMask::encode(self.days);
        if days_mask.is_empty() { return Err(TaskFormError::NoWeekday); }

        let default_minutes = self.default_minutes.trim().parse::<u32>()
            .map_err(|_| TaskFormError::InvalidMinutes(self.default_minutes.clone()))?;

        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_owned);

        Ok(TaskPayload {
            name: name.to_owned(),
            subject: subject.to_owned(),
            description,
            default_minutes,
            days_mask,
            is_archived: self.is_archived,
        })
    }
}

/// `"Math / 30 min"` plus weekday labels and an archived marker.
pub fn describe(task: &Task) -> String {
    let mut line = format!(
        "{} / {} min / {}",
        task.subject, task.default_minutes, task.days_mask.labels()
    );
    if task.is_archived { line.push_str(" / archived"); }
    line
}

/// Tasks scheduled on `date`, archived ones excluded.
pub fn scheduled_on(tasks: &[Task], date: CalendarDate) -> Vec<&Task> {
    tasks.iter()
        .filter(|t| !t.is_archived && t.days_mask.recurs_on(date))
        .collect()
}

/// Task list as printed by `sl tasks`: a count of today's tasks, then one
/// line per task with its description indented below.
pub fn overview(tasks: &[Task], today: CalendarDate) -> String {
    if tasks.is_empty() {
        return "No tasks.\n".to_owned();
    }
    let mut out = format!("{} task(s) scheduled today ({today})\n", scheduled_on(tasks, today).len());
    for t in tasks {
        out.push_str(&format!("{:<12} {}  {}\n", t.id, t.name, describe(t)));
        if let Some(desc) = t.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("{:<12} {desc}\n", ""));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(mask: u8, archived: bool) -> Task {
        Task {
            id: "t1".into(), name: "Drills".into(), subject: "Math".into(),
            description: None, default_minutes: 20,
            days_mask: WeekdayMask::from_bits(mask), is_archived: archived,
        }
    }

    fn filled() -> TaskForm {
        let mut form = TaskForm {
            name: " Drills ".into(), subject: "Math".into(), ..TaskForm::default()
        };
        form.toggle_day(1);
        form
    }

    #[test]
    fn validation_order() {
        let mut form = TaskForm::default();
        assert_eq!(form.validate(), Err(TaskFormError::NameRequired));
        form.name = "Drills".into();
        assert_eq!(form.validate(), Err(TaskFormError::SubjectRequired));
        form.subject = "Math".into();
        assert_eq!(form.validate(), Err(TaskFormError::NoWeekday));
        form.toggle_day(3);
        form.default_minutes = "ten".into();
        assert_eq!(form.validate(), Err(TaskFormError::InvalidMinutes("ten".into())));
        form.default_minutes = "-5".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn payload_uses_mask_and_trimmed_fields() {
        let payload = filled().validate().unwrap();
        assert_eq!(payload.name, "Drills");
        assert_eq!(payload.default_minutes, 30);
        assert_eq!(payload.days_mask.bits(), 0b10);
        assert_eq!(payload.description, None);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["days_mask"], 2);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn editing_round_trips_the_stored_task() {
        let stored = task(0b100_0001, true);
        let form = TaskForm::from_task(&stored);
        assert_eq!(form.days, [true, false, false, false, false, false, true]);
        let payload = form.validate().unwrap();
        assert_eq!(payload.days_mask, stored.days_mask);
        assert!(payload.is_archived);
        assert_eq!(describe(&stored), "Math / 20 min / Sun Sat / archived");
    }

    #[test]
    fn toggling_out_of_range_is_ignored() {
        let mut form = TaskForm::default();
        form.toggle_day(7);
        assert_eq!(form.days, [false; 7]);
    }

    #[test]
    fn scheduled_on_skips_archived_and_other_days() {
        let monday = CalendarDate::new(2024, 2, 11).unwrap();
        let tasks = vec![task(0b10, false), task(0b10, true), task(0b100, false)];
        assert_eq!(scheduled_on(&tasks, monday).len(), 1);
    }

    #[test]
    fn overview_of_an_empty_list_is_one_line() {
        let monday = CalendarDate::new(2024, 2, 11).unwrap();
        assert_eq!(overview(&[], monday), "No tasks.\n");
    }

    #[test]
    fn overview_counts_today_and_lists_every_task() {
        let monday = CalendarDate::new(2024, 2, 11).unwrap();
        let mut reading = task(0b100, false);
        reading.id = "t2".into();
        reading.description = Some("Chapter 4".into());
        let text = overview(&[task(0b10, false), reading], monday);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1 task(s) scheduled today (2024-03-11)");
        assert!(lines[1].starts_with("t1"));
        assert!(lines[2].starts_with("t2"));
        assert_eq!(lines[3].trim(), "Chapter 4");
        assert_eq!(lines.len(), 4);
    }
}
