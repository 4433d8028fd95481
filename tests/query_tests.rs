use chrono::NaiveDate;
use finance_tracker::core::query::sort_transactions;
use finance_tracker::core::{Expense, Query, SortKey, SortOrder};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn expense(day: u32, category: &str, description: &str, amount: Decimal) -> Expense {
    Expense {
        id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
        category: category.into(),
        description: description.into(),
        amount,
        payment_method: None,
    }
}

fn sample() -> Vec<Expense> {
    vec![
        expense(1, "food", "Morning coffee", dec!(4.5)),
        expense(3, "transport", "Bus pass", dec!(60)),
        expense(10, "Food", "Groceries", dec!(82.3)),
        expense(15, "food", "Coffee beans", dec!(18)),
        expense(20, "rent", "June rent", dec!(900)),
    ]
}

#[test]
fn category_and_amount_bounds() {
    let items = sample();
    let q: Query = "category:food min:10".parse().unwrap();
    let found: Vec<_> = q.filter(&items).iter().map(|e| e.amount).collect();
    assert_eq!(found, vec![dec!(82.3), dec!(18)]);
}

#[test]
fn words_match_description_case_insensitively() {
    let items = sample();
    let q: Query = "COFFEE".parse().unwrap();
    assert_eq!(q.filter(&items).len(), 2);
    let q: Query = "coffee beans".parse().unwrap();
    assert_eq!(q.filter(&items).len(), 1);
}

#[test]
fn date_range_is_inclusive() {
    let items = sample();
    let q: Query = "date:2024-06-03..2024-06-15".parse().unwrap();
    assert_eq!(q.filter(&items).len(), 3);
}

#[test]
fn empty_query_matches_everything() {
    let items = sample();
    let q: Query = "".parse().unwrap();
    assert_eq!(q.filter(&items).len(), items.len());
}

#[test]
fn sorts_by_amount_and_date() {
    let items = sample();
    let mut refs: Vec<&Expense> = items.iter().collect();
    sort_transactions(&mut refs, SortKey::Amount, SortOrder::Asc);
    assert_eq!(refs[0].amount, dec!(4.5));
    assert_eq!(refs[4].amount, dec!(900));

    sort_transactions(&mut refs, SortKey::Date, SortOrder::default());
    let days: Vec<_> = refs.iter().map(|e| e.date.format("%d").to_string()).collect();
    assert_eq!(days, vec!["20", "15", "10", "03", "01"]);
}

#[test]
fn sort_names() {
    assert_eq!("amount".parse::<SortKey>(), Ok(SortKey::Amount));
    assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
    assert!("price".parse::<SortKey>().is_err());
}
