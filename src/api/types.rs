use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarDate, WeekdayMask};

// ─── Auth ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email:    &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id:           String,
    pub email:        String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url:   Option<String>,
    #[serde(default)]
    pub provider:     Option<String>,
}

impl UserProfile {
    /// Trimmed display name, or the email when it is missing or blank.
    pub fn label(&self) -> &str {
        self.display_name.as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Body of `GET /me`.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

// ─── Children ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Child {
    pub id:    String,
    pub name:  String,
    #[serde(default)]
    pub grade: Option<String>,
}

/// Body of `POST /children`; an empty grade is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChild {
    pub name:  String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

/// Body of `PUT /children/{id}`; an empty grade is sent as `null` to clear it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildUpdate {
    pub name:  String,
    pub grade: Option<String>,
}

// ─── Tasks ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    pub id:              String,
    pub name:            String,
    pub subject:         String,
    #[serde(default)]
    pub description:     Option<String>,
    pub default_minutes: u32,
    pub days_mask:       WeekdayMask,
    #[serde(default)]
    pub is_archived:     bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPayload {
    pub name:            String,
    pub subject:         String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description:     Option<String>,
    pub default_minutes: u32,
    pub days_mask:       WeekdayMask,
    pub is_archived:     bool,
}

// ─── Daily checklist ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyTask {
    pub task_id: String,
    pub subject: String,
    pub name:    String,
    pub minutes: u32,
    pub is_done: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyView {
    #[serde(default)]
    pub tasks: Vec<DailyTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyItem {
    pub task_id: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySave {
    pub items: Vec<DailyItem>,
}

// ─── Calendar status ──────────────────────────────────────────────────────────

/// Per-day completion counts for the calendar heat-map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarDay {
    pub date:  CalendarDate,
    pub total: u32,
    pub done:  u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarStatus {
    #[serde(default)]
    pub days: Vec<CalendarDay>,
}

// ─── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummaryItem {
    pub minutes: u32,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub name:    Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub date:    Option<CalendarDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Summary {
    pub from:          CalendarDate,
    pub to:            CalendarDate,
    pub total_minutes: u32,
    #[serde(default)]
    pub by_day:        Vec<SummaryItem>,
    #[serde(default)]
    pub by_subject:    Vec<SummaryItem>,
    #[serde(default)]
    pub by_task:       Vec<SummaryItem>,
}
