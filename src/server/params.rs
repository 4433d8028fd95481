use std::fmt::Display;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};

use super::error::ApiError;
use crate::core::{EntryFilter, Query, SortKey, SortOrder, YearMonth};

/// Query-string parameters understood by the API routes.
///
/// Empty values count as absent; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    #[serde(default, deserialize_with = "present")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "present")]
    pub per_page: Option<usize>,
    #[serde(default, deserialize_with = "present")]
    pub month: Option<YearMonth>,
    #[serde(default, deserialize_with = "present")]
    pub kind: Option<Kind>,
    #[serde(default, deserialize_with = "present")]
    pub filter: Option<EntryFilter>,
    #[serde(default, deserialize_with = "present")]
    pub q: Option<Query>,
    #[serde(default, deserialize_with = "present")]
    pub sort: Option<SortKey>,
    #[serde(default, deserialize_with = "present")]
    pub order: Option<SortOrder>,
}

impl Params {
    pub fn parse(query: Option<&str>) -> Result<Self, ApiError> {
        serde_urlencoded::from_str(query.unwrap_or_default())
            .map_err(|e| ApiError::BadRequest(format!("invalid query string: {e}")))
    }
}

/// Which side of the books an analytics route reports on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    #[default]
    Expenses,
    Income,
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expenses" => Ok(Kind::Expenses),
            "income" => Ok(Kind::Income),
            other => Err(format!("invalid kind: {other}")),
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse().map(Some).map_err(DeError::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_typed_values() {
        let p = Params::parse(Some("q=category%3Afood+coffee&page=2&perPage=&month=2024-03")).unwrap();
        let q = p.q.unwrap();
        assert_eq!(q.categories, vec!["food"]);
        assert_eq!(q.terms, vec!["coffee"]);
        assert_eq!(p.page, Some(2));
        assert_eq!(p.per_page, None);
        assert_eq!(p.month, YearMonth::new(2024, 3));
        assert_eq!(p.kind, None);
    }

    #[test]
    fn missing_query_is_empty() {
        let p = Params::parse(None).unwrap();
        assert!(p.page.is_none() && p.month.is_none() && p.q.is_none());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Params::parse(Some("page=two")).is_err());
        assert!(Params::parse(Some("kind=assets")).is_err());
        assert!(Params::parse(Some("month=2147483647-12")).is_err());
        assert!(Params::parse(Some("unused=%zz")).is_ok());
    }
}
