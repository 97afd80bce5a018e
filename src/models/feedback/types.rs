use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Feedback lifecycle. Any state may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

pub const ALL_STATUSES: [FeedbackStatus; 4] = [
    FeedbackStatus::Pending,
    FeedbackStatus::InProgress,
    FeedbackStatus::Resolved,
    FeedbackStatus::Rejected,
];

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::InProgress => "in_progress",
            FeedbackStatus::Resolved => "resolved",
            FeedbackStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "Pending",
            FeedbackStatus::InProgress => "In Progress",
            FeedbackStatus::Resolved => "Resolved",
            FeedbackStatus::Rejected => "Rejected",
        }
    }

    /// Whether an update into `self` carrying `response` emails the submitter.
    pub fn should_notify(&self, response: &str) -> bool {
        *self == FeedbackStatus::Resolved || !response.trim().is_empty()
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .iter()
            .copied()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| format!("unknown feedback status '{s}'"))
    }
}

/// Council portfolios that feedback can be addressed to.
pub const PORTFOLIOS: &[(&str, &str)] = &[
    ("president", "President"),
    ("vice_president", "Vice President"),
    ("general_secretary", "General Secretary"),
    ("finance_officer", "Finance Officer"),
    ("organizing_secretary", "Organizing Secretary"),
    ("pro", "Public Relations Officer"),
    ("womens_commissioner", "Women's Commissioner"),
    ("academic_affairs", "Academic Affairs"),
    ("welfare", "Welfare Officer"),
    ("sports", "Sports Secretary"),
    ("general", "General"),
];

pub fn portfolio_label(slug: &str) -> &str {
    PORTFOLIOS
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, label)| *label)
        .unwrap_or(slug)
}

pub fn is_portfolio(slug: &str) -> bool {
    PORTFOLIOS.iter().any(|(s, _)| *s == slug)
}

/// Feedback row joined with the submitting and assigned users.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub subject: String,
    pub message: String,
    pub user_id: Option<i64>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub submitter_name: String,
    pub submitter_email: String,
    pub status: String,
    pub assigned_to: Option<i64>,
    pub assigned_name: Option<String>,
    pub resolution: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackRow {
    /// Registered submitter → "First Last"; direct submission → "Name (Direct Submission)".
    pub fn display_name(&self) -> String {
        if self.user_id.is_some() {
            let first = self.user_first_name.as_deref().unwrap_or("").trim();
            let last = self.user_last_name.as_deref().unwrap_or("").trim();
            let full = format!("{first} {last}").trim().to_string();
            if !full.is_empty() {
                return full;
            }
        }
        let name = self.submitter_name.trim();
        if !name.is_empty() {
            return format!("{name} (Direct Submission)");
        }
        "Anonymous".to_string()
    }

    pub fn display_email(&self) -> String {
        match self.user_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => self.submitter_email.trim().to_string(),
        }
    }

    pub fn subject_label(&self) -> &str {
        portfolio_label(&self.subject)
    }

    pub fn status_label(&self) -> &str {
        self.status
            .parse::<FeedbackStatus>()
            .map(|s| s.label())
            .unwrap_or("Unknown")
    }
}

/// Insert payload for a feedback submission.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub subject: String,
    pub message: String,
    pub user_id: Option<i64>,
    pub submitter_name: String,
    pub submitter_email: String,
}

/// Public submission form.
#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub submitter_name: String,
    #[serde(default)]
    pub submitter_email: String,
    pub csrf_token: String,
}

/// Admin status update form. `update_status` is the submit button marker.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateForm {
    pub status: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub resolution: String,
    pub update_status: Option<String>,
    pub csrf_token: String,
}

/// Validated status update.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: FeedbackStatus,
    pub assigned_to: Option<i64>,
    pub resolution: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub rejected: i64,
}
