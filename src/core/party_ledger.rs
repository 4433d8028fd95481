//! Running balances for trading-party ledgers.
//!
//! A party starts from its opening balance. Entries are replayed in date
//! order: purchases raise what the user owes the party, payments lower it and
//! adjustments apply their own signed amount. Entries that share a date keep
//! the order in which they were supplied, so the same input always yields the
//! same balance sequence.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{self, AmountOverflow};

/// Errors produced while computing a party statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// An entry carries a type outside purchase/payment/adjustment.
    InvalidEntryType(String),
    /// A display filter other than all/credit/debit was requested.
    UnknownFilter(String),
    /// A balance or total left the representable range.
    Overflow,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InvalidEntryType(t) => write!(f, "invalid ledger entry type: {t:?}"),
            LedgerError::UnknownFilter(t) => write!(f, "unknown ledger filter: {t:?}"),
            LedgerError::Overflow => write!(f, "ledger balance out of range"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<AmountOverflow> for LedgerError {
    fn from(_: AmountOverflow) -> Self {
        LedgerError::Overflow
    }
}

/// The fixed set of ledger entry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Purchase,
    Payment,
    Adjustment,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Purchase => "purchase",
            EntryKind::Payment => "payment",
            EntryKind::Adjustment => "adjustment",
        }
    }

    /// Signed effect of `amount` on the balance.
    pub fn delta(&self, amount: Decimal) -> Decimal {
        match self {
            EntryKind::Purchase | EntryKind::Adjustment => amount,
            EntryKind::Payment => -amount,
        }
    }
}

impl FromStr for EntryKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(EntryKind::Purchase),
            "payment" => Ok(EntryKind::Payment),
            "adjustment" => Ok(EntryKind::Adjustment),
            other => Err(LedgerError::InvalidEntryType(other.to_string())),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the ledger to display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryFilter {
    #[default]
    All,
    /// Purchases and positive adjustments.
    Credit,
    /// Payments and negative adjustments.
    Debit,
}

impl EntryFilter {
    pub fn matches(&self, kind: EntryKind, amount: Decimal) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::Credit => {
                kind == EntryKind::Purchase
                    || (kind == EntryKind::Adjustment && amount > Decimal::ZERO)
            }
            EntryFilter::Debit => {
                kind == EntryKind::Payment
                    || (kind == EntryKind::Adjustment && amount < Decimal::ZERO)
            }
        }
    }
}

impl FromStr for EntryFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(EntryFilter::All),
            "credit" => Ok(EntryFilter::Credit),
            "debit" => Ok(EntryFilter::Debit),
            other => Err(LedgerError::UnknownFilter(other.to_string())),
        }
    }
}

/// Anything that can be replayed against a party balance.
pub trait LedgerLine {
    fn date(&self) -> NaiveDate;
    /// Raw type string as stored; validated during computation.
    fn entry_type(&self) -> &str;
    fn amount(&self) -> Decimal;
}

/// An entry annotated with the balance after it was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine<E> {
    #[serde(flatten)]
    pub entry: E,
    pub running_balance: Decimal,
    #[serde(skip)]
    pub kind: EntryKind,
    #[serde(skip)]
    pub amount: Decimal,
}

/// Aggregate figures for the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub opening_balance: Decimal,
    pub total_purchases: Decimal,
    pub total_payments: Decimal,
    pub current_balance: Decimal,
    pub transaction_count: usize,
}

/// Chronological entries with running balances plus totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement<E> {
    pub lines: Vec<StatementLine<E>>,
    pub totals: LedgerTotals,
}

impl<E> Statement<E> {
    /// Keeps only the lines matching `filter`.
    ///
    /// Balances were computed over every entry, so retained lines keep their
    /// original running balance and the totals still describe the full ledger.
    pub fn filtered(mut self, filter: EntryFilter) -> Self {
        self.lines
            .retain(|line| filter.matches(line.kind, line.amount));
        self
    }

    pub fn balances(&self) -> Vec<Decimal> {
        self.lines.iter().map(|l| l.running_balance).collect()
    }
}

/// Builds the statement for a party with `opening_balance`.
///
/// Entries may arrive in any order. The whole computation fails on the first
/// entry whose type is not recognised, or when a balance or total overflows.
pub fn compute_statement<E>(
    opening_balance: Decimal,
    entries: &[E],
) -> Result<Statement<E>, LedgerError>
where
    E: LedgerLine + Clone,
{
    let mut ordered: Vec<(&E, EntryKind)> = entries
        .iter()
        .map(|e| e.entry_type().parse().map(|kind| (e, kind)))
        .collect::<Result<_, _>>()?;
    // stable: equal dates keep input order
    ordered.sort_by_key(|(e, _)| e.date());

    let mut totals = LedgerTotals {
        opening_balance,
        current_balance: opening_balance,
        transaction_count: ordered.len(),
        ..LedgerTotals::default()
    };
    let mut lines = Vec::with_capacity(ordered.len());
    for (entry, kind) in ordered {
        let amount = entry.amount();
        match kind {
            EntryKind::Purchase => {
                totals.total_purchases = money::add(totals.total_purchases, amount)?
            }
            EntryKind::Payment => totals.total_payments = money::add(totals.total_payments, amount)?,
            EntryKind::Adjustment if amount >= Decimal::ZERO => {
                totals.total_purchases = money::add(totals.total_purchases, amount)?
            }
            EntryKind::Adjustment => {
                totals.total_payments = money::add(totals.total_payments, amount.abs())?
            }
        }
        totals.current_balance = money::add(totals.current_balance, kind.delta(amount))?;
        lines.push(StatementLine {
            entry: entry.clone(),
            running_balance: totals.current_balance,
            kind,
            amount,
        });
    }
    Ok(Statement { lines, totals })
}
