use std::collections::HashMap;

use crate::models::query_filter::{DateBucket, WhereBuilder, non_empty};

/// Columns searched by the free-text filter on the feedback dashboard.
pub const SEARCH_COLUMNS: [&str; 7] = [
    "f.message",
    "f.subject",
    "u.first_name",
    "u.last_name",
    "u.email",
    "f.submitter_name",
    "f.submitter_email",
];

/// Dashboard filters; one optional field per query-string parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub date: Option<DateBucket>,
    pub search: Option<String>,
}

impl FeedbackFilter {
    /// `status`, `type` (portfolio), `date` and `search`. Blank values are absent;
    /// a `date` outside the closed set is dropped silently.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let date = non_empty(params, "date").and_then(|d| {
            let bucket = DateBucket::parse(&d);
            if bucket.is_none() {
                log::debug!("Ignoring unrecognized date filter '{d}'");
            }
            bucket
        });
        Self {
            status: non_empty(params, "status"),
            category: non_empty(params, "type"),
            date,
            search: non_empty(params, "search"),
        }
    }

    pub fn apply(&self, b: &mut WhereBuilder) {
        if let Some(status) = &self.status {
            b.push_eq("f.status", status);
        }
        if let Some(category) = &self.category {
            b.push_eq("f.subject", category);
        }
        if let Some(bucket) = self.date {
            b.push_date("f.created_at", bucket);
        }
        if let Some(term) = &self.search {
            b.push_search(&SEARCH_COLUMNS, term);
        }
    }

    pub fn to_builder(&self) -> WhereBuilder {
        let mut b = WhereBuilder::new();
        self.apply(&mut b);
        b
    }

    pub fn is_empty(&self) -> bool {
        *self == FeedbackFilter::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 4] = ["status", "type", "date", "search"];
    const VALUES: [&str; 4] = ["resolved", "president", "week", "library"];

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn no_parameters_means_no_where_clause() {
        let f = FeedbackFilter::from_query(&HashMap::new());
        assert!(f.is_empty());
        assert_eq!(f.to_builder().where_clause(), "");
    }

    #[test]
    fn predicate_count_matches_present_parameters_for_every_combination() {
        for mask in 0u8..16 {
            let pairs: Vec<(&str, &str)> = (0..4)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| (KEYS[i], VALUES[i]))
                .collect();
            let b = FeedbackFilter::from_query(&query(&pairs)).to_builder();
            assert_eq!(b.predicate_count(), pairs.len(), "mask {mask:04b}");

            let clause = b.where_clause();
            assert_eq!(clause.contains("f.status ="), mask & 1 != 0);
            assert_eq!(clause.contains("f.subject ="), mask & 2 != 0);
            assert_eq!(clause.contains("date_trunc"), mask & 4 != 0);
            assert_eq!(clause.contains("ILIKE"), mask & 8 != 0);
        }
    }

    #[test]
    fn empty_values_are_treated_as_absent() {
        let f = FeedbackFilter::from_query(&query(&[("status", ""), ("type", " "), ("search", "")]));
        assert!(f.is_empty());
    }

    #[test]
    fn unknown_date_bucket_equals_no_date_filter() {
        let with_bad = FeedbackFilter::from_query(&query(&[("status", "pending"), ("date", "yesterday")]));
        let without = FeedbackFilter::from_query(&query(&[("status", "pending")]));
        assert_eq!(with_bad, without);
        assert_eq!(with_bad.to_builder().where_clause(), without.to_builder().where_clause());
    }

    #[test]
    fn search_spans_seven_columns_with_one_parameter() {
        let b = FeedbackFilter::from_query(&query(&[("search", "jane@x.com")])).to_builder();
        assert_eq!(b.params(), ["jane@x.com"]);
        assert_eq!(b.where_clause().matches("ILIKE").count(), 7);
        assert_eq!(b.where_clause().matches(" OR ").count(), 6);
    }

    #[test]
    fn values_are_bound_not_interpolated() {
        let b = FeedbackFilter::from_query(&query(&[("status", "x' OR '1'='1")])).to_builder();
        assert_eq!(b.where_clause(), " WHERE f.status = $1");
        assert_eq!(b.params(), ["x' OR '1'='1"]);
    }
}
