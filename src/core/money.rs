//! Checked arithmetic on amounts.
//!
//! `Decimal` operators panic when a result leaves the representable range.
//! Amounts that pass validation can still add up past it, so derived figures
//! go through these helpers and report [`AmountOverflow`] instead.

use rust_decimal::Decimal;

/// A derived amount does not fit in a `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountOverflow;

impl std::fmt::Display for AmountOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("amount out of range")
    }
}

impl std::error::Error for AmountOverflow {}

pub fn add(a: Decimal, b: Decimal) -> Result<Decimal, AmountOverflow> {
    a.checked_add(b).ok_or(AmountOverflow)
}

pub fn sub(a: Decimal, b: Decimal) -> Result<Decimal, AmountOverflow> {
    a.checked_sub(b).ok_or(AmountOverflow)
}

pub fn mul(a: Decimal, b: Decimal) -> Result<Decimal, AmountOverflow> {
    a.checked_mul(b).ok_or(AmountOverflow)
}

/// Division by zero is reported as overflow; callers check for a zero
/// divisor first when zero has a meaning of its own.
pub fn div(a: Decimal, b: Decimal) -> Result<Decimal, AmountOverflow> {
    a.checked_div(b).ok_or(AmountOverflow)
}

pub fn sum<I>(amounts: I) -> Result<Decimal, AmountOverflow>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, add)
}
