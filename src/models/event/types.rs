use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub image_url: String,
    pub created_by: Option<i64>,
    pub creator_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.end_date.unwrap_or(self.event_date) >= now
    }

    /// Value for an `<input type="datetime-local">`.
    pub fn event_date_input(&self) -> String {
        self.event_date.format(INPUT_FORMAT).to_string()
    }

    pub fn end_date_input(&self) -> String {
        self.end_date.map(|d| d.format(INPUT_FORMAT).to_string()).unwrap_or_default()
    }
}

pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub event_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub image_url: String,
    pub csrf_token: String,
}

/// Validated create/update payload.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub image_url: String,
}

/// Parse a `datetime-local` value (seconds optional), interpreted as UTC.
pub fn parse_input_datetime(value: &str) -> Option<DateTime<Utc>> {
    let v = value.trim();
    NaiveDateTime::parse_from_str(v, INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

impl EventForm {
    /// Validate into an `EventInput`, or return every problem found.
    pub fn validate(&self) -> Result<EventInput, Vec<String>> {
        use crate::auth::validate;

        let mut errors = vec![];
        errors.extend(validate::validate_required(&self.title, "Title", 200));
        errors.extend(validate::validate_required(&self.description, "Description", 10_000));
        errors.extend(validate::validate_optional(&self.location, "Location", 200));
        errors.extend(validate::validate_optional(&self.image_url, "Image URL", 500));

        let event_date = parse_input_datetime(&self.event_date);
        if event_date.is_none() {
            errors.push("Event date is required".to_string());
        }
        let end_date = if self.end_date.trim().is_empty() {
            None
        } else {
            let parsed = parse_input_datetime(&self.end_date);
            if parsed.is_none() {
                errors.push("End date is not a valid date".to_string());
            }
            parsed
        };
        if let (Some(start), Some(end)) = (event_date, end_date) {
            if end < start {
                errors.push("End date cannot be before the event date".to_string());
            }
        }

        match event_date {
            Some(event_date) if errors.is_empty() => Ok(EventInput {
                title: self.title.trim().to_string(),
                description: self.description.trim().to_string(),
                location: self.location.trim().to_string(),
                event_date,
                end_date,
                image_url: self.image_url.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}
