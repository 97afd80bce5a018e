use std::collections::HashMap;

use crate::models::query_filter::{WhereBuilder, non_empty};

/// Filters for the admin user list.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl UserFilter {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        Self {
            role: non_empty(params, "role"),
            status: non_empty(params, "status"),
            search: non_empty(params, "search"),
        }
    }

    pub fn apply(&self, b: &mut WhereBuilder) {
        if let Some(role) = &self.role {
            b.push_eq("u.role", role);
        }
        if let Some(status) = &self.status {
            b.push_eq("u.status", status);
        }
        if let Some(term) = &self.search {
            b.push_search(&["u.username", "u.first_name", "u.last_name", "u.email"], term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_and_search() {
        let params: HashMap<String, String> = [("role", "admin"), ("search", "kofi"), ("status", "")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut b = WhereBuilder::new();
        UserFilter::from_query(&params).apply(&mut b);
        assert_eq!(b.predicate_count(), 2);
        assert!(b.where_clause().starts_with(" WHERE u.role = $1 AND (u.username ILIKE"));
    }
}
