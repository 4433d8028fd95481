use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::aggregate::Transaction;
use super::calendar::parse_date;

/// Filter over expenses or income parsed from a token string such as
/// `category:food start:2024-01-01 max:50 coffee`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query {
    pub categories: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    /// Lowercased words that must all appear in the description or category.
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidToken(String),
    InvalidDate(String),
    InvalidAmount(String),
    InvalidSort(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidToken(t) => write!(f, "invalid token: {t}"),
            ParseError::InvalidDate(d) => write!(f, "invalid date: {d}"),
            ParseError::InvalidAmount(a) => write!(f, "invalid amount: {a}"),
            ParseError::InvalidSort(s) => write!(f, "invalid sort: {s}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut q = Query::default();
        for token in s.split_whitespace() {
            if let Some(rest) = token.strip_prefix("category:") {
                q.categories.push(rest.to_string());
            } else if let Some(rest) = token.strip_prefix("start:") {
                q.start = Some(date(rest)?);
            } else if let Some(rest) = token.strip_prefix("end:") {
                q.end = Some(date(rest)?);
            } else if let Some(rest) = token.strip_prefix("date:") {
                let parts: Vec<&str> = rest.split("..").collect();
                if parts.len() != 2 {
                    return Err(ParseError::InvalidToken(token.into()));
                }
                if !parts[0].is_empty() {
                    q.start = Some(date(parts[0])?);
                }
                if !parts[1].is_empty() {
                    q.end = Some(date(parts[1])?);
                }
            } else if let Some(rest) = token.strip_prefix("min:") {
                q.min = Some(amount(rest)?);
            } else if let Some(rest) = token.strip_prefix("max:") {
                q.max = Some(amount(rest)?);
            } else if token.contains(':') {
                return Err(ParseError::InvalidToken(token.into()));
            } else {
                q.terms.push(token.to_lowercase());
            }
        }
        Ok(q)
    }
}

fn date(s: &str) -> Result<NaiveDate, ParseError> {
    parse_date(s).ok_or_else(|| ParseError::InvalidDate(s.into()))
}

fn amount(s: &str) -> Result<Decimal, ParseError> {
    Decimal::from_str(s).map_err(|_| ParseError::InvalidAmount(s.into()))
}

impl Query {
    pub fn matches<T: Transaction>(&self, t: &T) -> bool {
        let date = t.date();
        if self.start.is_some_and(|start| date < start) {
            return false;
        }
        if self.end.is_some_and(|end| date > end) {
            return false;
        }
        if self.min.is_some_and(|min| t.amount() < min) {
            return false;
        }
        if self.max.is_some_and(|max| t.amount() > max) {
            return false;
        }
        if !self.categories.is_empty()
            && !self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(t.category()))
        {
            return false;
        }
        if !self.terms.is_empty() {
            let haystack = format!("{} {}", t.description(), t.category()).to_lowercase();
            if !self.terms.iter().all(|term| haystack.contains(term)) {
                return false;
            }
        }
        true
    }

    pub fn filter<'a, T: Transaction>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|t| self.matches(*t)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Date,
    Amount,
}

impl FromStr for SortKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortKey::Date),
            "amount" => Ok(SortKey::Amount),
            other => Err(ParseError::InvalidSort(other.into())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ParseError::InvalidSort(other.into())),
        }
    }
}

/// Stable sort; items with equal keys keep their stored order.
pub fn sort_transactions<T: Transaction>(items: &mut [&T], key: SortKey, order: SortOrder) {
    items.sort_by(|a, b| {
        let ord = match key {
            SortKey::Date => a.date().cmp(&b.date()),
            SortKey::Amount => a.amount().cmp(&b.amount()),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}
