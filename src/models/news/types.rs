use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const NEWS_STATUSES: &[(&str, &str)] = &[("published", "Published"), ("draft", "Draft")];

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author_id: Option<i64>,
    pub author_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which drafts a reader may see alongside published items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAccess {
    All,
    AuthoredBy(i64),
}

impl NewsItem {
    pub fn is_published(&self) -> bool {
        self.status == "published"
    }

    pub fn is_visible_to(&self, access: DraftAccess) -> bool {
        match access {
            DraftAccess::All => true,
            DraftAccess::AuthoredBy(uid) => self.is_published() || self.author_id == Some(uid),
        }
    }

    /// First 200 characters of the body, on a char boundary.
    pub fn excerpt(&self) -> String {
        let text = self.content.trim();
        match text.char_indices().nth(200) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewsForm {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub csrf_token: String,
}

fn default_status() -> String {
    "published".to_string()
}

/// Validated create/update payload.
#[derive(Debug, Clone)]
pub struct NewsInput {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub status: String,
}

impl NewsForm {
    pub fn validate(&self) -> Result<NewsInput, Vec<String>> {
        use crate::auth::validate;

        let mut errors = vec![];
        errors.extend(validate::validate_required(&self.title, "Title", 200));
        errors.extend(validate::validate_required(&self.content, "Content", 20_000));
        errors.extend(validate::validate_optional(&self.image_url, "Image URL", 500));
        if !NEWS_STATUSES.iter().any(|(s, _)| *s == self.status) {
            errors.push("Status must be draft or published".to_string());
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewsInput {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            image_url: self.image_url.trim().to_string(),
            status: self.status.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_rejects_unknown_status() {
        let form = NewsForm {
            title: "Budget hearing".into(),
            content: "Open to all students".into(),
            image_url: String::new(),
            status: "archived".into(),
            csrf_token: "t".into(),
        };
        assert!(form.validate().is_err());
        let ok = NewsForm { status: "draft".into(), ..form };
        assert_eq!(ok.validate().unwrap().status, "draft");
    }

    fn item(status: &str, author_id: Option<i64>) -> NewsItem {
        NewsItem {
            id: 1,
            title: "t".into(),
            content: "é".repeat(250),
            image_url: String::new(),
            author_id,
            author_name: String::new(),
            status: status.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn drafts_visible_to_editors_and_author() {
        let draft = item("draft", Some(7));
        assert!(draft.is_visible_to(DraftAccess::All));
        assert!(draft.is_visible_to(DraftAccess::AuthoredBy(7)));
        assert!(!draft.is_visible_to(DraftAccess::AuthoredBy(8)));
        assert!(item("published", Some(7)).is_visible_to(DraftAccess::AuthoredBy(8)));
        assert!(!item("draft", None).is_visible_to(DraftAccess::AuthoredBy(8)));
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let item = item("published", None);
        let ex = item.excerpt();
        assert!(ex.ends_with("..."));
        assert_eq!(ex.chars().count(), 203);
    }
}
