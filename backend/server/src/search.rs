//! # Listing search
//!
//! Browse/search over kos listings.
//!
//! ## Matching
//! - Name, address and description are folded into one normalized `search_text`
//!   column when a kos is written
//! - The query goes through the same normalization, then every word must appear
//! - Normalized text only holds `[a-z0-9- ]`, so words never carry `LIKE` wildcards
//!
//! ## Filters
//! - `gender=male|female` also matches kos open to `all`
//! - `available_only` hides full kos
//! - Price bounds are inclusive
use std::sync::LazyLock;

use regex::Regex;
use rooms::Gender;
use rusqlite::types::Value;
use serde::Deserialize;

use crate::utils::Pagination;

static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_]").expect("valid regex"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9- ]").expect("valid regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

pub fn sanitize(input: &str) -> String {
    let s = UNDERSCORES.replace_all(input, " ");
    let s = SPACES.replace_all(&s, " ");
    let s = DISALLOWED.replace_all(&s, "");

    SPACES.replace_all(s.trim(), " ").to_lowercase()
}

pub fn search_text(name: &str, address: &str, description: &str) -> String {
    sanitize(&format!("{name} {address} {description}"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
}

impl Sort {
    pub fn order_by(&self) -> &'static str {
        match self {
            Sort::Newest => "k.created_at DESC, k.id DESC",
            Sort::PriceAsc => "k.price_per_month ASC, k.id ASC",
            Sort::PriceDesc => "k.price_per_month DESC, k.id DESC",
            Sort::Rating => "rating IS NULL, rating DESC, k.id DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub gender: Option<Gender>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    #[serde(default)]
    pub available_only: bool,
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub sort: Sort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `WHERE` clause and its positional parameters.
#[derive(Debug, Default)]
pub struct Filter {
    pub clause: String,
    pub params: Vec<Value>,
}

impl Filter {
    fn push(&mut self, condition: &str, params: impl IntoIterator<Item = Value>) {
        self.clause
            .push_str(if self.clause.is_empty() { " WHERE " } else { " AND " });
        self.clause.push_str(condition);
        self.params.extend(params);
    }
}

impl ListingQuery {
    pub fn filter(&self) -> Filter {
        let mut filter = Filter::default();

        if let Some(search) = &self.search {
            for word in sanitize(search).split(' ').filter(|w| !w.is_empty()) {
                filter.push(
                    "k.search_text LIKE ?",
                    [Value::Text(format!("%{word}%"))],
                );
            }
        }

        match self.gender {
            Some(Gender::All) => filter.push("k.gender = 'all'", []),
            Some(gender) => filter.push(
                "k.gender IN (?, 'all')",
                [Value::Text(gender.as_str().to_string())],
            ),
            None => {}
        }

        if let Some(min) = self.min_price {
            filter.push("k.price_per_month >= ?", [Value::Integer(min)]);
        }

        if let Some(max) = self.max_price {
            filter.push("k.price_per_month <= ?", [Value::Integer(max)]);
        }

        if self.available_only {
            filter.push("k.available_rooms > 0", []);
        }

        if let Some(owner_id) = self.owner_id {
            filter.push("k.owner_id = ?", [Value::Integer(owner_id)]);
        }

        filter
    }

    pub fn pagination(&self, max_per_page: u32) -> Pagination {
        Pagination::new(self.page, self.per_page, max_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        assert_eq!(sanitize("hello_world"), "hello world");
        assert_eq!(sanitize("Kos-Putri"), "kos-putri");
        assert_eq!(sanitize("Jl. Kenanga No.12!"), "jl kenanga no12");
    }

    #[test]
    fn test_leading_trailing_spaces() {
        assert_eq!(sanitize("   kos   "), "kos");
        assert_eq!(sanitize("  dekat\tkampus  UB "), "dekat kampus ub");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(sanitize("!@#$%^&*()"), "");
        assert_eq!(sanitize("100%_wifi"), "100 wifi");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("     "), "");
    }

    #[test]
    fn empty_query_has_no_clause() {
        let filter = ListingQuery::default().filter();

        assert!(filter.clause.is_empty());
        assert!(filter.params.is_empty());
    }

    #[test]
    fn every_word_must_match() {
        let query = ListingQuery {
            search: Some("Kos  Melati!".to_string()),
            max_price: Some(1_000_000),
            available_only: true,
            ..Default::default()
        };
        let filter = query.filter();

        assert_eq!(
            filter.clause,
            " WHERE k.search_text LIKE ? AND k.search_text LIKE ? AND k.price_per_month <= ? AND k.available_rooms > 0"
        );
        assert_eq!(
            filter.params,
            vec![
                Value::Text("%kos%".to_string()),
                Value::Text("%melati%".to_string()),
                Value::Integer(1_000_000),
            ]
        );
    }

    #[test]
    fn gender_filter_includes_mixed_kos() {
        let query = ListingQuery {
            gender: Some(Gender::Female),
            ..Default::default()
        };

        assert_eq!(query.filter().clause, " WHERE k.gender IN (?, 'all')");
    }
}
