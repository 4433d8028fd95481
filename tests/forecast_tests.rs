use chrono::NaiveDate;
use finance_tracker::core::forecast::{forecast_spending, project, trailing_history};
use finance_tracker::core::{Expense, YearMonth};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn expense(y: i32, m: u32, amount: Decimal) -> Expense {
    Expense {
        id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(y, m, 12).unwrap(),
        category: "general".into(),
        description: String::new(),
        amount,
        payment_method: None,
    }
}

#[test]
fn falling_spending_is_clamped_at_zero() {
    let (rate, projected) = project(&[dec!(300), dec!(200), dec!(100)]).unwrap();
    assert_eq!(rate, dec!(-100));
    assert_eq!(projected, vec![Decimal::ZERO, Decimal::ZERO, Decimal::ZERO]);
}

#[test]
fn single_month_repeats() {
    let (rate, projected) = project(&[dec!(42.5)]).unwrap();
    assert_eq!(rate, Decimal::ZERO);
    assert_eq!(projected, vec![dec!(42.5); 3]);
}

#[test]
fn no_history_projects_nothing() {
    let (rate, projected) = project(&[]).unwrap();
    assert_eq!(rate, Decimal::ZERO);
    assert!(projected.is_empty());
}

#[test]
fn history_is_zero_filled() {
    let expenses = vec![expense(2024, 2, dec!(50)), expense(2024, 2, dec!(25))];
    let history = trailing_history(&expenses, YearMonth::new(2024, 3).unwrap()).unwrap();
    let months: Vec<String> = history.iter().map(|p| p.month.to_string()).collect();
    assert_eq!(
        months,
        vec!["2023-10", "2023-11", "2023-12", "2024-01", "2024-02", "2024-03"]
    );
    let amounts: Vec<Decimal> = history.iter().map(|p| p.amount).collect();
    assert_eq!(
        amounts,
        vec![
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(75),
            Decimal::ZERO
        ]
    );
}

#[test]
fn rising_spending_projects_the_next_quarter() {
    let expenses: Vec<Expense> = (7..=12)
        .map(|m| expense(2024, m, Decimal::from(100 + 20 * (m as i64 - 7))))
        .collect();
    let forecast = forecast_spending(&expenses, YearMonth::new(2024, 12).unwrap()).unwrap();
    assert_eq!(forecast.growth_rate, dec!(20));
    let projected: Vec<(String, Decimal)> = forecast
        .projected
        .iter()
        .map(|p| (p.month.to_string(), p.amount))
        .collect();
    assert_eq!(
        projected,
        vec![
            ("2025-01".to_string(), dec!(220)),
            ("2025-02".to_string(), dec!(240)),
            ("2025-03".to_string(), dec!(260)),
        ]
    );
}
