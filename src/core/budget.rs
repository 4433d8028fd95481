use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::aggregate::percentage_of;
use super::calendar::YearMonth;
use super::money::{self, AmountOverflow};
use super::{Budget, Expense, Period, SavingsGoal};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub budget_id: Uuid,
    pub category: String,
    pub period: Period,
    pub limit: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent_used: Decimal,
    pub over_budget: bool,
}

impl Budget {
    /// Compares the budget with expenses in its category for the month
    /// `reference`, or its whole year for yearly budgets.
    pub fn status(
        &self,
        expenses: &[Expense],
        reference: YearMonth,
    ) -> Result<BudgetStatus, AmountOverflow> {
        let spent = money::sum(
            expenses
                .iter()
                .filter(|e| e.category.eq_ignore_ascii_case(self.category.trim()))
                .filter(|e| match self.period {
                    Period::Monthly => reference.contains(e.date),
                    Period::Yearly => e.date.year() == reference.year,
                })
                .map(|e| e.amount),
        )?;
        Ok(BudgetStatus {
            budget_id: self.id,
            category: self.category.clone(),
            period: self.period,
            limit: self.limit,
            spent,
            remaining: money::sub(self.limit, spent)?,
            percent_used: percentage_of(spent, self.limit)?,
            over_budget: spent > self.limit,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsProgress {
    pub goal_id: Uuid,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub remaining: Decimal,
    pub percent_complete: Decimal,
    /// Amount to set aside each month to meet the deadline.
    pub monthly_required: Option<Decimal>,
}

impl SavingsGoal {
    pub fn progress(&self, today: NaiveDate) -> Result<SavingsProgress, AmountOverflow> {
        let remaining = money::sub(self.target_amount, self.current_amount)?.max(Decimal::ZERO);
        let percent_complete =
            percentage_of(self.current_amount, self.target_amount)?.min(Decimal::ONE_HUNDRED);
        let monthly_required = match self.deadline {
            None => None,
            Some(_) if remaining.is_zero() => Some(Decimal::ZERO),
            Some(deadline) if deadline < today => Some(remaining),
            Some(deadline) => {
                let months = YearMonth::of(today).months_until(YearMonth::of(deadline)).max(1);
                Some(money::div(remaining, Decimal::from(months))?.round_dp(2))
            }
        };
        Ok(SavingsProgress {
            goal_id: self.id,
            name: self.name.clone(),
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            remaining,
            percent_complete,
            monthly_required,
        })
    }
}
