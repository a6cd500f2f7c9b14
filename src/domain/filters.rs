//! Query filters and their canonical cache-key form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Separator between the parts of a filter signature.
pub const PART_SEPARATOR: &str = "|";

// == Transaction Filters ==
/// Filters applied to revenue/expense listings, statistics and aggregations.
///
/// Every field is optional; absent fields do not constrain the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFilters {
    pub status: Vec<String>,
    pub category_ids: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
}

impl TransactionFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status.push(status.into());
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_ids.push(category_id.into());
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    // == Cache Signature ==
    /// Deterministic key suffix for these filters, or None when no field
    /// constrains the query.
    ///
    /// Multi-value fields are sorted and de-duplicated, dates use
    /// `YYYY-MM-DD`, and search text is percent-encoded, so filters with the
    /// same effective constraints always produce the same signature.
    pub fn cache_signature(&self) -> Option<String> {
        let mut parts = Vec::new();

        if let Some(status) = normalized_list(&self.status) {
            parts.push(format!("status:{}", status));
        }
        if let Some(categories) = normalized_list(&self.category_ids) {
            parts.push(format!("categories:{}", categories));
        }
        if let Some(start) = self.start_date {
            parts.push(format!("from:{}", start.format("%Y-%m-%d")));
        }
        if let Some(end) = self.end_date {
            parts.push(format!("to:{}", end.format("%Y-%m-%d")));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("search:{}", urlencoding::encode(search)));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(PART_SEPARATOR))
        }
    }
}

fn normalized_list(values: &[String]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    Some(sorted.join(","))
}
