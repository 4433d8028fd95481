use chrono::NaiveDate;
use finance_tracker::core::aggregate::{category_totals, monthly_totals, within};
use finance_tracker::core::{
    AmountOverflow, Credit, CreditKind, CreditStatus, Database, Expense, Income, PeriodSummary,
    YearMonth, percentage_of,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(date: NaiveDate, category: &str, amount: Decimal) -> Expense {
    Expense {
        id: Uuid::new_v4(),
        date,
        category: category.into(),
        description: String::new(),
        amount,
        payment_method: None,
    }
}

fn income(date: NaiveDate, source: &str, amount: Decimal) -> Income {
    Income {
        id: Uuid::new_v4(),
        date,
        source: source.into(),
        category: String::new(),
        description: String::new(),
        amount,
    }
}

fn credit(kind: CreditKind, status: CreditStatus, amount: Decimal) -> Credit {
    Credit {
        id: Uuid::new_v4(),
        person: "Ali".into(),
        kind,
        amount,
        date: date(2024, 1, 1),
        due_date: None,
        status,
        description: String::new(),
    }
}

#[test]
fn percentage_of_zero_total_is_zero() {
    assert_eq!(percentage_of(dec!(10), Decimal::ZERO), Ok(Decimal::ZERO));
    assert_eq!(percentage_of(dec!(1), dec!(3)), Ok(dec!(33.33)));
}

#[test]
fn category_totals_largest_first() {
    let expenses = vec![
        expense(date(2024, 1, 3), "food", dec!(30)),
        expense(date(2024, 1, 9), "rent", dec!(50)),
        expense(date(2024, 2, 1), "food", dec!(20)),
    ];
    let totals = category_totals(&expenses).unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].category, "food");
    assert_eq!(totals[0].total, dec!(50));
    assert_eq!(totals[0].count, 2);
    assert_eq!(totals[0].percentage, dec!(50));
    // ties are broken by name
    assert_eq!(totals[1].category, "rent");
}

#[test]
fn category_totals_for_one_month() {
    let expenses = vec![
        expense(date(2024, 1, 3), "food", dec!(30)),
        expense(date(2024, 2, 1), "food", dec!(20)),
    ];
    let totals = category_totals(within(&expenses, YearMonth::new(2024, 2))).unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].total, dec!(20));
    assert_eq!(totals[0].percentage, dec!(100));
}

#[test]
fn monthly_totals_are_ascending() {
    let expenses = vec![
        expense(date(2024, 3, 3), "food", dec!(5)),
        expense(date(2023, 12, 31), "food", dec!(7)),
        expense(date(2024, 3, 20), "fuel", dec!(15)),
    ];
    let totals = monthly_totals(&expenses).unwrap();
    let months: Vec<String> = totals.iter().map(|t| t.month.to_string()).collect();
    assert_eq!(months, vec!["2023-12", "2024-03"]);
    assert_eq!(totals[1].total, dec!(20));
    assert_eq!(totals[1].count, 2);
}

#[test]
fn income_without_category_groups_by_source() {
    let income = vec![
        income(date(2024, 1, 1), "salary", dec!(3000)),
        income(date(2024, 1, 15), "freelance", dec!(1000)),
    ];
    let totals = category_totals(&income).unwrap();
    assert_eq!(totals[0].category, "salary");
    assert_eq!(totals[0].percentage, dec!(75));
}

#[test]
fn period_summary() {
    let db = Database {
        income: vec![
            income(date(2024, 4, 1), "salary", dec!(2000)),
            income(date(2024, 5, 1), "salary", dec!(2000)),
        ],
        expenses: vec![
            expense(date(2024, 4, 10), "rent", dec!(1500)),
            expense(date(2024, 5, 10), "rent", dec!(500)),
        ],
        credits: vec![
            credit(CreditKind::Lent, CreditStatus::Pending, dec!(100)),
            credit(CreditKind::Lent, CreditStatus::Settled, dec!(999)),
            credit(CreditKind::Borrowed, CreditStatus::Pending, dec!(40)),
        ],
        ..Database::default()
    };
    let april = PeriodSummary::compute(&db, YearMonth::new(2024, 4)).unwrap();
    assert_eq!(april.net, dec!(500));
    assert_eq!(april.savings_rate, dec!(25));
    assert_eq!(april.outstanding_lent, dec!(100));
    assert_eq!(april.outstanding_borrowed, dec!(40));

    let all = PeriodSummary::compute(&db, None).unwrap();
    assert_eq!(all.total_income, dec!(4000));
    assert_eq!(all.total_expenses, dec!(2000));
    assert_eq!(all.savings_rate, dec!(50));
}

#[test]
fn empty_period_has_zero_rate() {
    let summary = PeriodSummary::compute(&Database::default(), None).unwrap();
    assert_eq!(summary.savings_rate, Decimal::ZERO);
    assert_eq!(summary.net, Decimal::ZERO);
}

#[test]
fn sums_past_decimal_range_are_errors() {
    assert_eq!(percentage_of(Decimal::MAX, dec!(0.0001)), Err(AmountOverflow));

    let expenses = vec![
        expense(date(2024, 1, 1), "rent", Decimal::MAX),
        expense(date(2024, 1, 2), "rent", Decimal::MAX),
    ];
    assert_eq!(category_totals(&expenses), Err(AmountOverflow));
    assert_eq!(monthly_totals(&expenses), Err(AmountOverflow));

    let db = Database {
        income: vec![income(date(2024, 1, 1), "salary", Decimal::MAX)],
        expenses: vec![expense(date(2024, 1, 2), "rent", Decimal::MAX)],
        ..Database::default()
    };
    // net is zero but each side still fits
    assert_eq!(PeriodSummary::compute(&db, None).unwrap().net, Decimal::ZERO);
    let db = Database {
        credits: vec![
            credit(CreditKind::Lent, CreditStatus::Pending, Decimal::MAX),
            credit(CreditKind::Lent, CreditStatus::Pending, Decimal::MAX),
        ],
        ..Database::default()
    };
    assert_eq!(PeriodSummary::compute(&db, None), Err(AmountOverflow));
}
