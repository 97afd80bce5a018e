//! Parameterized `WHERE` clause construction for list pages.
//!
//! Each list page owns a typed filter struct (one optional field per query
//! parameter). The struct appends one bound predicate per populated field to
//! a [`WhereBuilder`]; an empty builder renders no `WHERE` clause at all.
//! Column expressions passed in are hardcoded SQL, never user input.

use std::collections::HashMap;

/// Calendar window used by the `date` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Today,
    Week,
    Month,
}

impl DateBucket {
    /// Unrecognized values yield `None` and therefore no predicate.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "today" => Some(DateBucket::Today),
            "week" => Some(DateBucket::Week),
            "month" => Some(DateBucket::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateBucket::Today => "today",
            DateBucket::Week => "week",
            DateBucket::Month => "month",
        }
    }

    /// Fixed SQL comparing `col` against the current calendar window.
    pub fn sql(&self, col: &str) -> String {
        match self {
            DateBucket::Today => format!("({col})::date = CURRENT_DATE"),
            DateBucket::Week => format!("date_trunc('week', {col}) = date_trunc('week', NOW())"),
            DateBucket::Month => format!("date_trunc('month', {col}) = date_trunc('month', NOW())"),
        }
    }
}

/// Accumulates predicates joined by `AND` and their positional parameters.
#[derive(Debug, Default)]
pub struct WhereBuilder {
    predicates: Vec<String>,
    params: Vec<String>,
    offset: usize,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering placeholders after `offset` already-bound parameters.
    pub fn with_offset(offset: usize) -> Self {
        Self { offset, ..Self::default() }
    }

    fn next_placeholder(&mut self, value: &str) -> String {
        self.params.push(value.to_string());
        format!("${}", self.offset + self.params.len())
    }

    /// `col = $n`
    pub fn push_eq(&mut self, col: &str, value: &str) {
        let p = self.next_placeholder(value);
        self.predicates.push(format!("{col} = {p}"));
    }

    /// A fixed expression without parameters.
    pub fn push_raw(&mut self, sql: String) {
        self.predicates.push(sql);
    }

    pub fn push_date(&mut self, col: &str, bucket: DateBucket) {
        self.push_raw(bucket.sql(col));
    }

    /// One OR-group of case-insensitive substring matches. The term is bound
    /// once and every column references the same placeholder.
    pub fn push_search(&mut self, cols: &[&str], term: &str) {
        if cols.is_empty() {
            return;
        }
        let p = self.next_placeholder(term);
        let group = cols
            .iter()
            .map(|c| format!("{c} ILIKE '%' || {p} || '%'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.predicates.push(format!("({group})"));
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// `" WHERE a AND b"`, or an empty string when nothing was pushed.
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    /// `" AND a AND b"` for queries that already carry a WHERE clause.
    pub fn and_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" AND {}", self.predicates.join(" AND "))
        }
    }

    pub fn into_params(self) -> Vec<String> {
        self.params
    }
}

/// Read a query parameter, treating missing and blank values alike.
pub fn non_empty(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Search + date filter shared by the news and events lists.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub search: Option<String>,
    pub date: Option<DateBucket>,
}

impl ContentFilter {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let date = non_empty(params, "date").and_then(|d| {
            let bucket = DateBucket::parse(&d);
            if bucket.is_none() {
                log::debug!("Ignoring unrecognized date filter '{d}'");
            }
            bucket
        });
        Self { search: non_empty(params, "search"), date }
    }

    pub fn apply(&self, b: &mut WhereBuilder, date_col: &str, search_cols: &[&str]) {
        if let Some(bucket) = self.date {
            b.push_date(date_col, bucket);
        }
        if let Some(term) = &self.search {
            b.push_search(search_cols, term);
        }
    }

    pub fn search_value(&self) -> String {
        self.search.clone().unwrap_or_default()
    }

    pub fn date_value(&self) -> &'static str {
        self.date.map(|d| d.as_str()).unwrap_or("")
    }
}

/// An `<option>` entry with its selected state precomputed for templates.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn list<'a>(
        items: impl IntoIterator<Item = (&'a str, &'a str)>,
        current: &str,
    ) -> Vec<SelectOption> {
        items
            .into_iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: label.to_string(),
                selected: value == current,
            })
            .collect()
    }
}

/// Options for the date filter dropdown, including "any".
pub fn date_options(current: &str) -> Vec<SelectOption> {
    SelectOption::list(
        [("", "Any time"), ("today", "Today"), ("week", "This week"), ("month", "This month")],
        current,
    )
}
