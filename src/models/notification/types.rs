use chrono::{DateTime, Utc};

/// What kind of item a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    News,
    Event,
    Feedback,
    User,
    System,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Event => "event",
            ContentType::Feedback => "feedback",
            ContentType::User => "user",
            ContentType::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
    Deleted,
    StatusChanged,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
            Action::StatusChanged => "status_changed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub content_type: ContentType,
    pub action: Action,
    pub title: String,
    pub description: String,
    pub created_by: Option<i64>,
    pub item_id: Option<i64>,
}

/// A notification as seen by one recipient.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationItem {
    pub id: i64,
    pub content_type: String,
    pub action: String,
    pub title: String,
    pub description: String,
    pub item_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationItem {
    /// Page the notification points at, if the item type has one.
    pub fn link(&self) -> Option<String> {
        let id = self.item_id?;
        match self.content_type.as_str() {
            "news" => Some(format!("/news/{id}")),
            "event" => Some(format!("/events/{id}")),
            "feedback" => Some("/feedback".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content_type: &str, item_id: Option<i64>) -> NotificationItem {
        NotificationItem {
            id: 1,
            content_type: content_type.into(),
            action: "created".into(),
            title: "t".into(),
            description: String::new(),
            item_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn links_by_content_type() {
        assert_eq!(item("news", Some(4)).link().as_deref(), Some("/news/4"));
        assert_eq!(item("event", Some(9)).link().as_deref(), Some("/events/9"));
        assert_eq!(item("system", Some(1)).link(), None);
        assert_eq!(item("news", None).link(), None);
    }
}
