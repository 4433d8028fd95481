use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::calendar::YearMonth;
use super::money::{self, AmountOverflow};
use super::{CreditKind, CreditStatus, Database, Expense, Income};

/// A dated, categorised amount that can be grouped and summed.
pub trait Transaction {
    fn date(&self) -> NaiveDate;
    fn category(&self) -> &str;
    fn amount(&self) -> Decimal;
    fn description(&self) -> &str;
}

impl Transaction for Expense {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl Transaction for Income {
    fn date(&self) -> NaiveDate {
        self.date
    }

    /// Income without a category is grouped by its source.
    fn category(&self) -> &str {
        if self.category.trim().is_empty() {
            &self.source
        } else {
            &self.category
        }
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// `part` as a percentage of `total`, rounded to two places. A zero total
/// yields zero.
pub fn percentage_of(part: Decimal, total: Decimal) -> Result<Decimal, AmountOverflow> {
    if total.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let ratio = money::div(part, total)?;
    Ok(money::mul(ratio, Decimal::ONE_HUNDRED)?.round_dp(2))
}

pub fn total<'a, T, I>(items: I) -> Result<Decimal, AmountOverflow>
where
    T: Transaction + 'a,
    I: IntoIterator<Item = &'a T>,
{
    money::sum(items.into_iter().map(Transaction::amount))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
    pub percentage: Decimal,
}

/// Sums amounts per category, largest first.
pub fn category_totals<'a, T, I>(items: I) -> Result<Vec<CategoryTotal>, AmountOverflow>
where
    T: Transaction + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut groups: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for item in items {
        let slot = groups.entry(item.category()).or_default();
        slot.0 = money::add(slot.0, item.amount())?;
        slot.1 += 1;
    }
    let grand_total = money::sum(groups.values().map(|(t, _)| *t))?;
    let mut out = groups
        .into_iter()
        .map(|(category, (total, count))| {
            Ok(CategoryTotal {
                category: category.to_string(),
                total,
                count,
                percentage: percentage_of(total, grand_total)?,
            })
        })
        .collect::<Result<Vec<_>, AmountOverflow>>()?;
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub total: Decimal,
    pub count: usize,
}

/// Sums amounts per calendar month in ascending month order.
pub fn monthly_totals<'a, T, I>(items: I) -> Result<Vec<MonthlyTotal>, AmountOverflow>
where
    T: Transaction + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut groups: BTreeMap<YearMonth, (Decimal, usize)> = BTreeMap::new();
    for item in items {
        let slot = groups.entry(YearMonth::of(item.date())).or_default();
        slot.0 = money::add(slot.0, item.amount())?;
        slot.1 += 1;
    }
    Ok(groups
        .into_iter()
        .map(|(month, (total, count))| MonthlyTotal {
            month,
            total,
            count,
        })
        .collect())
}

/// Items dated inside `month`, or all of them when `month` is `None`.
pub fn within<'a, T: Transaction>(
    items: &'a [T],
    month: Option<YearMonth>,
) -> impl Iterator<Item = &'a T> + 'a {
    items
        .iter()
        .filter(move |t| month.is_none_or(|m| m.contains(t.date())))
}

/// Dashboard figures for one month or for all time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub month: Option<YearMonth>,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net: Decimal,
    pub savings_rate: Decimal,
    /// Pending money lent to others.
    pub outstanding_lent: Decimal,
    /// Pending money owed to others.
    pub outstanding_borrowed: Decimal,
}

impl PeriodSummary {
    pub fn compute(db: &Database, month: Option<YearMonth>) -> Result<Self, AmountOverflow> {
        let total_income = total(within(&db.income, month))?;
        let total_expenses = total(within(&db.expenses, month))?;
        let net = money::sub(total_income, total_expenses)?;
        let outstanding = |kind: CreditKind| {
            money::sum(
                db.credits
                    .iter()
                    .filter(|c| c.kind == kind && c.status == CreditStatus::Pending)
                    .map(|c| c.amount),
            )
        };
        Ok(Self {
            month,
            total_income,
            total_expenses,
            net,
            savings_rate: percentage_of(net, total_income)?,
            outstanding_lent: outstanding(CreditKind::Lent)?,
            outstanding_borrowed: outstanding(CreditKind::Borrowed)?,
        })
    }
}
