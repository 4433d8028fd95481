//! Naive linear spending forecast.
//!
//! The next months are extrapolated from the first and last month of the
//! trailing window with a constant per-month delta, never going below zero.
//! No seasonality or regression is applied.

use rust_decimal::Decimal;
use serde::Serialize;

use super::Expense;
use super::aggregate::{total, within};
use super::calendar::YearMonth;
use super::money::{self, AmountOverflow};

/// Months of history considered.
pub const HISTORY_MONTHS: usize = 6;
/// Months projected.
pub const FORECAST_MONTHS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub month: YearMonth,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub history: Vec<ForecastPoint>,
    pub growth_rate: Decimal,
    pub projected: Vec<ForecastPoint>,
}

/// Applies the linear rule to monthly totals, oldest first.
///
/// Returns the per-month growth rate and [`FORECAST_MONTHS`] projected
/// totals. Only the last [`HISTORY_MONTHS`] values are used; an empty history
/// projects nothing and a single month repeats itself.
pub fn project(history: &[Decimal]) -> Result<(Decimal, Vec<Decimal>), AmountOverflow> {
    let window = &history[history.len().saturating_sub(HISTORY_MONTHS)..];
    let (Some(&first), Some(&last)) = (window.first(), window.last()) else {
        return Ok((Decimal::ZERO, Vec::new()));
    };
    let n = window.len();
    let growth_rate = if n > 1 {
        money::div(money::sub(last, first)?, Decimal::from(n - 1))?
    } else {
        Decimal::ZERO
    };
    let projected = (1..=FORECAST_MONTHS)
        .map(|k| {
            let value = money::add(last, money::mul(growth_rate, Decimal::from(k))?)?;
            Ok(value.max(Decimal::ZERO).round_dp(2))
        })
        .collect::<Result<Vec<_>, AmountOverflow>>()?;
    Ok((growth_rate, projected))
}

/// Expense totals for the [`HISTORY_MONTHS`] months ending with
/// `reference`, zero-filled.
pub fn trailing_history(
    expenses: &[Expense],
    reference: YearMonth,
) -> Result<Vec<ForecastPoint>, AmountOverflow> {
    let mut months = Vec::with_capacity(HISTORY_MONTHS);
    let mut month = reference;
    for _ in 0..HISTORY_MONTHS {
        months.push(month);
        month = month.pred();
    }
    months.reverse();
    months
        .into_iter()
        .map(|month| {
            Ok(ForecastPoint {
                month,
                amount: total(within(expenses, Some(month)))?,
            })
        })
        .collect()
}

/// Forecasts the three months after `reference` from recorded expenses.
pub fn forecast_spending(
    expenses: &[Expense],
    reference: YearMonth,
) -> Result<Forecast, AmountOverflow> {
    let history = trailing_history(expenses, reference)?;
    let amounts: Vec<Decimal> = history.iter().map(|p| p.amount).collect();
    let (growth_rate, values) = project(&amounts)?;
    let mut month = reference;
    let projected = values
        .into_iter()
        .map(|amount| {
            month = month.succ();
            ForecastPoint { month, amount }
        })
        .collect();
    Ok(Forecast {
        history,
        growth_rate: growth_rate.round_dp(2),
        projected,
    })
}
