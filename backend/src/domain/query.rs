//! Filter/query normalization for the list endpoint.
//!
//! Turns the raw `GET /users` query string into the ordered parameter list
//! handed to the upstream API: blank values are dropped, a default sort is
//! applied when none is supplied, and `page` passes through unmodified.

use serde::{Deserialize, Serialize};

use super::user::Gender;

/// Sort column applied when the request names none.
pub const DEFAULT_SORT: &str = "id";
/// Sort direction applied when the request names no sort column.
pub const DEFAULT_DIRECTION: &str = "asc";

const FILTER_KEYS: [&str; 5] = [
    "first_name",
    "last_name",
    "gender",
    "birthdate_from",
    "birthdate_to",
];

/// Raw `GET /users` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Given-name filter.
    pub first_name: Option<String>,
    /// Family-name filter.
    pub last_name: Option<String>,
    /// Gender filter (`male` / `female`).
    pub gender: Option<String>,
    /// Inclusive lower birthdate bound, `YYYY-MM-DD`.
    pub birthdate_from: Option<String>,
    /// Inclusive upper birthdate bound, `YYYY-MM-DD`.
    pub birthdate_to: Option<String>,
    /// Sort column, upstream-validated.
    pub sort: Option<String>,
    /// Sort direction, upstream-validated.
    pub direction: Option<String>,
    /// Requested page, passed through unmodified.
    pub page: Option<String>,
}

/// Normalized, ordered parameter list for the upstream list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    params: Vec<(String, String)>,
}

impl ListQuery {
    /// Normalize raw query parameters.
    ///
    /// Always succeeds; invalid filter values are dropped the way the
    /// filter form would drop them, never rejected.
    pub fn from_params(raw: &ListParams) -> Self {
        let mut params = Vec::new();

        push_present(&mut params, "first_name", raw.first_name.as_deref());
        push_present(&mut params, "last_name", raw.last_name.as_deref());
        if let Some(gender) = present(raw.gender.as_deref()) {
            // Only known choices reach the upstream; anything else is noise
            // from a hand-edited URL.
            if gender.parse::<Gender>().is_ok() {
                params.push(("gender".to_owned(), gender));
            }
        }
        push_date(&mut params, "birthdate_from", raw.birthdate_from.as_deref());
        push_date(&mut params, "birthdate_to", raw.birthdate_to.as_deref());

        match present(raw.sort.as_deref()) {
            Some(sort) => {
                params.push(("sort".to_owned(), sort));
                if let Some(direction) = present(raw.direction.as_deref()) {
                    params.push(("direction".to_owned(), direction));
                }
            }
            None => {
                params.push(("sort".to_owned(), DEFAULT_SORT.to_owned()));
                params.push(("direction".to_owned(), DEFAULT_DIRECTION.to_owned()));
            }
        }

        if let Some(page) = present(raw.page.as_deref()) {
            params.push(("page".to_owned(), page));
        }

        Self { params }
    }

    /// Ordered key/value pairs for the upstream call.
    pub fn params(&self) -> &[(String, String)] {
        self.params.as_slice()
    }

    /// Value for a named key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Effective sort column.
    pub fn sort(&self) -> &str {
        self.get("sort").unwrap_or(DEFAULT_SORT)
    }

    /// Effective sort direction.
    pub fn direction(&self) -> &str {
        self.get("direction").unwrap_or(DEFAULT_DIRECTION)
    }

    /// Filter pairs only, excluding sort, direction, and page.
    ///
    /// Used when rebuilding links that change ordering or pagination but
    /// keep the active filters.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|(key, _)| FILTER_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_owned)
}

fn push_present(params: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(value) = present(value) {
        params.push((key.to_owned(), value));
    }
}

fn push_date(params: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(value) = present(value) {
        if chrono::NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_ok() {
            params.push((key.to_owned(), value));
        }
    }
}
