//! Finance records and the validation rules shared by every collection.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod aggregate;
pub mod budget;
pub mod calendar;
pub mod forecast;
pub mod money;
pub mod party_ledger;
pub mod query;

pub use aggregate::{CategoryTotal, MonthlyTotal, PeriodSummary, Transaction, percentage_of};
pub use budget::{BudgetStatus, SavingsProgress};
pub use calendar::YearMonth;
pub use forecast::{Forecast, ForecastPoint};
pub use money::AmountOverflow;
pub use party_ledger::{
    EntryFilter, EntryKind, LedgerError, LedgerLine, LedgerTotals, Statement, StatementLine,
    compute_statement,
};
pub use query::{ParseError, Query, SortKey, SortOrder};

/// Errors that can occur when validating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required text field is empty.
    MissingField(&'static str),
    /// The amount provided is not positive.
    NonPositiveAmount,
    /// The named amount is below zero.
    NegativeAmount(&'static str),
    /// Adjustments must move the balance.
    ZeroAdjustment,
    /// The ledger entry type is not purchase/payment/adjustment.
    EntryType(LedgerError),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::MissingField(name) => write!(f, "{name} must not be empty"),
            RecordError::NonPositiveAmount => write!(f, "amount must be positive"),
            RecordError::NegativeAmount(name) => write!(f, "{name} must not be negative"),
            RecordError::ZeroAdjustment => write!(f, "adjustment amount must not be zero"),
            RecordError::EntryType(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::EntryType(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LedgerError> for RecordError {
    fn from(e: LedgerError) -> Self {
        RecordError::EntryType(e)
    }
}

fn require(value: &str, name: &'static str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        Err(RecordError::MissingField(name))
    } else {
        Ok(())
    }
}

fn require_positive(amount: Decimal) -> Result<(), RecordError> {
    if amount <= Decimal::ZERO {
        Err(RecordError::NonPositiveAmount)
    } else {
        Ok(())
    }
}

/// A record kept in one of the [`Database`] collections.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + 'static {
    /// Collection name used in routes and log fields.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
    fn validate(&self) -> Result<(), RecordError>;
    fn items(db: &Database) -> &Vec<Self>;
    fn items_mut(db: &mut Database) -> &mut Vec<Self>;

    /// Called before the record is stored; `previous` is the record being
    /// replaced on update.
    fn before_save(&mut self, _previous: Option<&Self>) {}
}

macro_rules! stored_in {
    ($field:ident) => {
        fn id(&self) -> Uuid {
            self.id
        }

        fn set_id(&mut self, id: Uuid) {
            self.id = id;
        }

        fn items(db: &Database) -> &Vec<Self> {
            &db.$field
        }

        fn items_mut(db: &mut Database) -> &mut Vec<Self> {
            &mut db.$field
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub id: Uuid,
    #[serde(with = "calendar::flexible_date")]
    pub date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl Entity for Expense {
    const COLLECTION: &'static str = "expenses";
    stored_in!(expenses);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.category, "category")?;
        require_positive(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    #[serde(default)]
    pub id: Uuid,
    #[serde(with = "calendar::flexible_date")]
    pub date: NaiveDate,
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
}

impl Entity for Income {
    const COLLECTION: &'static str = "income";
    stored_in!(income);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.source, "source")?;
        require_positive(self.amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditKind {
    /// Money the user lent to someone.
    Lent,
    /// Money the user borrowed from someone.
    Borrowed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    #[default]
    Pending,
    Settled,
}

/// A personal credit or debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credit {
    #[serde(default)]
    pub id: Uuid,
    pub person: String,
    pub kind: CreditKind,
    pub amount: Decimal,
    #[serde(with = "calendar::flexible_date")]
    pub date: NaiveDate,
    #[serde(default, with = "calendar::flexible_date_opt")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: CreditStatus,
    #[serde(default)]
    pub description: String,
}

impl Entity for Credit {
    const COLLECTION: &'static str = "credits";
    stored_in!(credits);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.person, "person")?;
        require_positive(self.amount)
    }
}

/// A supplier or customer with a running balance.
///
/// Totals are never stored here; see [`PartyView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub notes: String,
}

impl Entity for Party {
    const COLLECTION: &'static str = "parties";
    stored_in!(parties);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.name, "name")
    }
}

/// A party together with totals derived from its ledger entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyView {
    #[serde(flatten)]
    pub party: Party,
    pub total_purchases: Decimal,
    pub total_payments: Decimal,
    pub current_balance: Decimal,
    pub transaction_count: usize,
}

impl PartyView {
    pub fn new(party: Party, totals: LedgerTotals) -> Self {
        Self {
            party,
            total_purchases: totals.total_purchases,
            total_payments: totals.total_payments,
            current_balance: totals.current_balance,
            transaction_count: totals.transaction_count,
        }
    }
}

/// A single purchase, payment or adjustment against a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub party_id: Uuid,
    #[serde(with = "calendar::flexible_date")]
    pub date: NaiveDate,
    /// Kept as text so a bad value in the data file surfaces as
    /// [`LedgerError::InvalidEntryType`] instead of failing the whole load.
    #[serde(rename = "type")]
    pub entry_type: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl LedgerEntry {
    pub fn kind(&self) -> Result<EntryKind, LedgerError> {
        self.entry_type.parse()
    }
}

impl LedgerLine for LedgerEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn entry_type(&self) -> &str {
        &self.entry_type
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Entity for LedgerEntry {
    const COLLECTION: &'static str = "ledger-entries";
    stored_in!(ledger_entries);

    fn validate(&self) -> Result<(), RecordError> {
        match self.kind()? {
            EntryKind::Adjustment if self.amount.is_zero() => Err(RecordError::ZeroAdjustment),
            EntryKind::Adjustment => Ok(()),
            EntryKind::Purchase | EntryKind::Payment => require_positive(self.amount),
        }
    }

    fn before_save(&mut self, previous: Option<&Self>) {
        if let Some(previous) = previous {
            if self.party_id.is_nil() {
                self.party_id = previous.party_id;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Note {
    const COLLECTION: &'static str = "notes";
    stored_in!(notes);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.title, "title")
    }

    fn before_save(&mut self, previous: Option<&Self>) {
        let now = Utc::now();
        self.created_at = previous.map(|p| p.created_at).unwrap_or(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "calendar::flexible_date_opt")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Entity for Task {
    const COLLECTION: &'static str = "tasks";
    stored_in!(tasks);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.title, "title")
    }

    fn before_save(&mut self, previous: Option<&Self>) {
        if let Some(previous) = previous {
            self.created_at = previous.created_at;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Monthly,
    Yearly,
}

/// A spending limit for one expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(default)]
    pub id: Uuid,
    pub category: String,
    pub limit: Decimal,
    #[serde(default)]
    pub period: Period,
}

impl Entity for Budget {
    const COLLECTION: &'static str = "budgets";
    stored_in!(budgets);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.category, "category")?;
        require_positive(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    #[serde(default, with = "calendar::flexible_date_opt")]
    pub deadline: Option<NaiveDate>,
}

impl Entity for SavingsGoal {
    const COLLECTION: &'static str = "savings-goals";
    stored_in!(savings_goals);

    fn validate(&self) -> Result<(), RecordError> {
        require(&self.name, "name")?;
        require_positive(self.target_amount)?;
        if self.current_amount < Decimal::ZERO {
            return Err(RecordError::NegativeAmount("currentAmount"));
        }
        Ok(())
    }
}

/// Everything persisted in `database.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub expenses: Vec<Expense>,
    pub income: Vec<Income>,
    pub credits: Vec<Credit>,
    pub parties: Vec<Party>,
    pub ledger_entries: Vec<LedgerEntry>,
    pub notes: Vec<Note>,
    pub tasks: Vec<Task>,
    pub budgets: Vec<Budget>,
    pub savings_goals: Vec<SavingsGoal>,
}

impl Database {
    /// Ledger entries of one party in stored order.
    pub fn entries_for(&self, party_id: Uuid) -> Vec<LedgerEntry> {
        self.ledger_entries
            .iter()
            .filter(|e| e.party_id == party_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn entry(kind: &str, amount: &str) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            party_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            entry_type: kind.into(),
            amount: Decimal::from_str(amount).unwrap(),
            description: None,
            reference: None,
        }
    }

    #[test]
    fn ledger_entry_amount_rules() {
        assert!(entry("purchase", "10").validate().is_ok());
        assert_eq!(
            entry("payment", "-1").validate(),
            Err(RecordError::NonPositiveAmount)
        );
        assert!(entry("adjustment", "-5").validate().is_ok());
        assert_eq!(
            entry("adjustment", "0").validate(),
            Err(RecordError::ZeroAdjustment)
        );
        assert_eq!(
            entry("refund", "5").validate(),
            Err(RecordError::EntryType(LedgerError::InvalidEntryType(
                "refund".into()
            )))
        );
    }

    #[test]
    fn expense_accepts_timestamp_dates_and_missing_id() {
        let json = r#"{"date":"2024-02-10T18:30:00.000Z","category":"food","amount":12.5}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert!(expense.id.is_nil());
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(expense.amount, Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let goal = SavingsGoal {
            id: Uuid::nil(),
            name: "  ".into(),
            target_amount: Decimal::ONE,
            current_amount: Decimal::ZERO,
            deadline: None,
        };
        assert_eq!(goal.validate(), Err(RecordError::MissingField("name")));
    }
}
