//! Aggregation of ledger data for the dashboard summary cards and charts.
//!
//! All money sums use [Decimal]; values are converted to `f64` only at the
//! chart boundary. Every function returns zeros for empty input.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    account::Account,
    budget::BudgetWithCategory,
    database_id::DatabaseId,
    money::to_chart_value,
    transaction::{Transaction, TransactionKind},
};

/// The number of months shown in the expense trend chart.
const TREND_MONTHS: usize = 6;

/// The inclusive date range covering the calendar month that contains `today`.
///
/// Uses real month lengths, so February of a leap year ends on the 29th.
pub(super) fn month_bounds(today: Date) -> RangeInclusive<Date> {
    let last_day = time::util::days_in_year_month(today.year(), today.month());

    // Day 1 and the month's own last day are always valid.
    let first = today.replace_day(1).unwrap_or(today);
    let last = today.replace_day(last_day).unwrap_or(today);

    first..=last
}

/// The dashboard's headline numbers for the current month.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MonthlySummary {
    /// Income received this month.
    pub income: Decimal,
    /// Money spent this month.
    pub expense: Decimal,
    /// Income minus expenses for this month.
    pub net: Decimal,
    /// Total money across all accounts right now.
    pub live_total: Decimal,
    /// What the total would be with this month's expenses taken out.
    pub live_after_month_expense: Decimal,
    /// The money available this month: the live total with this month's
    /// expenses removed and this month's income added back.
    pub live_money: Decimal,
}

/// Compute the monthly summary for the month containing `today`.
pub(super) fn monthly_summary(
    today: Date,
    accounts: &[Account],
    transactions: &[Transaction],
) -> MonthlySummary {
    let bounds = month_bounds(today);

    let mut month_income = Decimal::ZERO;
    let mut month_expense = Decimal::ZERO;
    let mut all_income = Decimal::ZERO;
    let mut all_expense = Decimal::ZERO;

    for transaction in transactions {
        let in_month = bounds.contains(&transaction.date);

        match transaction.kind {
            TransactionKind::Income => {
                all_income += transaction.amount;
                if in_month {
                    month_income += transaction.amount;
                }
            }
            TransactionKind::Expense => {
                all_expense += transaction.amount;
                if in_month {
                    month_expense += transaction.amount;
                }
            }
        }
    }

    let opening_total: Decimal = accounts
        .iter()
        .map(|account| account.opening_balance)
        .sum();

    let live_total = opening_total + all_income - all_expense;
    let live_after_month_expense = live_total - month_expense;
    let live_money = live_after_month_expense + month_income;

    MonthlySummary {
        income: month_income,
        expense: month_expense,
        net: month_income - month_expense,
        live_total,
        live_after_month_expense,
        live_money,
    }
}

/// Sum expenses per day for the month containing `today`.
///
/// Returns one point per calendar day. Labels are zero-padded day numbers,
/// values are the per-day expense totals with `0.0` for days without
/// expenses.
pub(super) fn daily_expense_series(
    today: Date,
    transactions: &[Transaction],
) -> (Vec<String>, Vec<f64>) {
    let bounds = month_bounds(today);
    let last_day = bounds.end().day();

    let mut totals_by_day: HashMap<u8, Decimal> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionKind::Expense)
        .filter(|transaction| bounds.contains(&transaction.date))
    {
        *totals_by_day
            .entry(transaction.date.day())
            .or_insert(Decimal::ZERO) += transaction.amount;
    }

    let labels = (1..=last_day).map(|day| format!("{day:02}")).collect();
    let values = (1..=last_day)
        .map(|day| {
            totals_by_day
                .get(&day)
                .copied()
                .map(to_chart_value)
                .unwrap_or(0.0)
        })
        .collect();

    (labels, values)
}

/// Total expenses per month for the six months ending with the month that
/// contains `today`, oldest month first.
///
/// Labels are "YYYY-MM" strings, so they sort in the same order the points
/// are returned.
pub(super) fn six_month_trend(
    today: Date,
    transactions: &[Transaction],
) -> (Vec<String>, Vec<f64>) {
    let mut totals_by_month: HashMap<(i32, Month), Decimal> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionKind::Expense)
    {
        *totals_by_month
            .entry((transaction.date.year(), transaction.date.month()))
            .or_insert(Decimal::ZERO) += transaction.amount;
    }

    let mut labels = Vec::with_capacity(TREND_MONTHS);
    let mut values = Vec::with_capacity(TREND_MONTHS);

    let mut year = today.year();
    let mut month = today.month();

    for _ in 0..TREND_MONTHS {
        labels.push(format!("{year:04}-{:02}", month as u8));
        values.push(
            totals_by_month
                .get(&(year, month))
                .copied()
                .map(to_chart_value)
                .unwrap_or(0.0),
        );

        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    labels.reverse();
    values.reverse();

    (labels, values)
}

/// Budgeted versus actual spending per category for the current month.
///
/// The three vectors are parallel and aligned by budget list order. Only
/// categories with a budget row for the current month appear.
#[derive(Debug, Clone, PartialEq, Default)]
pub(super) struct BudgetVsActual {
    /// Category names.
    pub labels: Vec<String>,
    /// The budgeted limit per category.
    pub budgeted: Vec<f64>,
    /// The amount actually spent per category this month.
    pub spent: Vec<f64>,
}

/// Compare each of this month's budgets against the actual spend in its
/// category.
pub(super) fn budget_vs_actual(
    today: Date,
    budgets: &[BudgetWithCategory],
    transactions: &[Transaction],
) -> BudgetVsActual {
    let bounds = month_bounds(today);
    let current_month = *bounds.start();

    let mut spend_by_category: HashMap<DatabaseId, Decimal> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionKind::Expense)
        .filter(|transaction| bounds.contains(&transaction.date))
    {
        *spend_by_category
            .entry(transaction.category_id)
            .or_insert(Decimal::ZERO) += transaction.amount;
    }

    let mut result = BudgetVsActual::default();

    for entry in budgets
        .iter()
        .filter(|entry| entry.budget.month == current_month)
    {
        let spent = spend_by_category
            .get(&entry.budget.category_id)
            .copied()
            .unwrap_or(Decimal::ZERO);

        result.labels.push(entry.category_name.clone());
        result.budgeted.push(to_chart_value(entry.budget.amount));
        result.spent.push(to_chart_value(spent));
    }

    result
}

#[cfg(test)]
mod aggregation_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::{Date, macros::date};

    use crate::{
        account::{Account, create_account, live_balance_total, live_balances},
        auth::PasswordHash,
        budget::{Budget, BudgetWithCategory},
        category::create_category,
        db::initialize,
        transaction::{
            Transaction, TransactionData, TransactionKind, create_transaction,
            get_all_transactions,
        },
        user::{UserId, create_user},
    };

    use super::{
        budget_vs_actual, daily_expense_series, month_bounds, monthly_summary, six_month_trend,
    };

    fn transaction(kind: TransactionKind, amount: &str, date: Date, category_id: i64) -> Transaction {
        Transaction {
            id: 0,
            user_id: UserId::new(1),
            account_id: 1,
            category_id,
            kind,
            amount: amount.parse().unwrap(),
            date,
            note: String::new(),
        }
    }

    fn account(opening_balance: &str) -> Account {
        Account {
            id: 1,
            user_id: UserId::new(1),
            name: "Checking".to_owned(),
            opening_balance: opening_balance.parse().unwrap(),
        }
    }

    #[test]
    fn month_bounds_covers_whole_month() {
        let bounds = month_bounds(date!(2025 - 06 - 15));

        assert_eq!(*bounds.start(), date!(2025 - 06 - 01));
        assert_eq!(*bounds.end(), date!(2025 - 06 - 30));
    }

    #[test]
    fn month_bounds_handles_leap_february() {
        let bounds = month_bounds(date!(2024 - 02 - 10));

        assert_eq!(*bounds.end(), date!(2024 - 02 - 29));
    }

    #[test]
    fn monthly_summary_is_all_zeros_without_data() {
        let summary = monthly_summary(date!(2025 - 06 - 15), &[], &[]);

        assert_eq!(summary.income, Decimal::ZERO);
        assert_eq!(summary.expense, Decimal::ZERO);
        assert_eq!(summary.net, Decimal::ZERO);
        assert_eq!(summary.live_total, Decimal::ZERO);
        assert_eq!(summary.live_money, Decimal::ZERO);
    }

    #[test]
    fn monthly_summary_computes_live_money() {
        let today = date!(2025 - 06 - 15);
        let accounts = [account("1000.00")];
        let transactions = [
            transaction(TransactionKind::Income, "500.00", date!(2025 - 06 - 01), 1),
            transaction(TransactionKind::Expense, "200.00", date!(2025 - 06 - 10), 2),
            // Last month, counts towards the live total only.
            transaction(TransactionKind::Expense, "100.00", date!(2025 - 05 - 20), 2),
        ];

        let summary = monthly_summary(today, &accounts, &transactions);

        assert_eq!(summary.income, "500.00".parse::<Decimal>().unwrap());
        assert_eq!(summary.expense, "200.00".parse::<Decimal>().unwrap());
        assert_eq!(summary.net, "300.00".parse::<Decimal>().unwrap());
        // 1000 + 500 - 200 - 100
        assert_eq!(summary.live_total, "1200.00".parse::<Decimal>().unwrap());
        assert_eq!(
            summary.live_after_month_expense,
            "1000.00".parse::<Decimal>().unwrap()
        );
        assert_eq!(summary.live_money, "1500.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn live_balance_total_matches_live_total() {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "foo@bar.baz",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");
        let user_id = user.id;

        let checking =
            create_account(&connection, user_id, "Checking", "100.00".parse().unwrap()).unwrap();
        let savings =
            create_account(&connection, user_id, "Savings", "50.00".parse().unwrap()).unwrap();
        let salary =
            create_category(&connection, user_id, "Salary", TransactionKind::Income).unwrap();
        let food = create_category(&connection, user_id, "Food", TransactionKind::Expense).unwrap();

        let entries = [
            (
                checking.id,
                salary.id,
                TransactionKind::Income,
                "500.00",
                date!(2025 - 06 - 01),
            ),
            (
                checking.id,
                food.id,
                TransactionKind::Expense,
                "200.00",
                date!(2025 - 06 - 10),
            ),
            // Last month, so it is outside the summary's month bounds.
            (
                savings.id,
                food.id,
                TransactionKind::Expense,
                "100.00",
                date!(2025 - 05 - 20),
            ),
        ];
        for (account_id, category_id, kind, amount, date) in entries {
            create_transaction(
                &connection,
                user_id,
                TransactionData {
                    account_id,
                    category_id,
                    kind,
                    amount: amount.parse().unwrap(),
                    date,
                    note: String::new(),
                },
            )
            .unwrap();
        }

        let balances = live_balances(user_id, &connection).unwrap();
        let accounts: Vec<_> = balances
            .iter()
            .map(|balance| balance.account.clone())
            .collect();
        let transactions = get_all_transactions(user_id, &connection).unwrap();

        let summary = monthly_summary(date!(2025 - 06 - 15), &accounts, &transactions);

        // The per-account grouping and the all-time summary loop must agree.
        assert_eq!(live_balance_total(&balances), summary.live_total);
        assert_eq!(summary.live_total, "350.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn daily_series_has_one_point_per_day() {
        let today = date!(2025 - 06 - 15);

        let (labels, values) = daily_expense_series(today, &[]);

        assert_eq!(labels.len(), 30);
        assert_eq!(values.len(), 30);
        assert_eq!(labels[0], "01");
        assert_eq!(labels[29], "30");
        assert!(values.iter().all(|&value| value == 0.0));
    }

    #[test]
    fn daily_series_sums_to_month_expense() {
        let today = date!(2025 - 06 - 15);
        let transactions = [
            transaction(TransactionKind::Expense, "10.00", date!(2025 - 06 - 01), 1),
            transaction(TransactionKind::Expense, "15.50", date!(2025 - 06 - 01), 1),
            transaction(TransactionKind::Expense, "4.50", date!(2025 - 06 - 30), 1),
            // Income and other months must not appear.
            transaction(TransactionKind::Income, "99.00", date!(2025 - 06 - 02), 1),
            transaction(TransactionKind::Expense, "50.00", date!(2025 - 05 - 31), 1),
        ];

        let (_, values) = daily_expense_series(today, &transactions);

        assert_eq!(values[0], 25.50);
        assert_eq!(values[29], 4.50);
        let total: f64 = values.iter().sum();
        assert!((total - 30.0).abs() < 1e-9);
    }

    #[test]
    fn trend_returns_six_months_oldest_first() {
        let today = date!(2025 - 06 - 15);

        let (labels, values) = six_month_trend(today, &[]);

        assert_eq!(labels.len(), 6);
        assert_eq!(values.len(), 6);
        assert_eq!(
            labels,
            vec![
                "2025-01", "2025-02", "2025-03", "2025-04", "2025-05", "2025-06"
            ]
        );
        assert!(labels.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn trend_handles_year_rollover() {
        let today = date!(2025 - 02 - 10);
        let transactions = [transaction(
            TransactionKind::Expense,
            "42.00",
            date!(2024 - 11 - 05),
            1,
        )];

        let (labels, values) = six_month_trend(today, &transactions);

        assert_eq!(
            labels,
            vec![
                "2024-09", "2024-10", "2024-11", "2024-12", "2025-01", "2025-02"
            ]
        );
        assert_eq!(values[2], 42.0);
    }

    #[test]
    fn budget_vs_actual_only_includes_current_month_budgets() {
        let today = date!(2025 - 06 - 15);
        let budgets = [
            BudgetWithCategory {
                budget: Budget {
                    id: 1,
                    user_id: UserId::new(1),
                    category_id: 10,
                    month: date!(2025 - 06 - 01),
                    amount: "400.00".parse().unwrap(),
                },
                category_name: "Groceries".to_owned(),
            },
            BudgetWithCategory {
                budget: Budget {
                    id: 2,
                    user_id: UserId::new(1),
                    category_id: 11,
                    month: date!(2025 - 05 - 01),
                    amount: "100.00".parse().unwrap(),
                },
                category_name: "Dining".to_owned(),
            },
        ];
        let transactions = [
            transaction(TransactionKind::Expense, "123.45", date!(2025 - 06 - 10), 10),
            // Spend in an unbudgeted category produces no row.
            transaction(TransactionKind::Expense, "50.00", date!(2025 - 06 - 10), 99),
        ];

        let result = budget_vs_actual(today, &budgets, &transactions);

        assert_eq!(result.labels, vec!["Groceries"]);
        assert_eq!(result.budgeted, vec![400.0]);
        assert_eq!(result.spent, vec![123.45]);
    }

    #[test]
    fn budget_vs_actual_reports_zero_spend() {
        let today = date!(2025 - 06 - 15);
        let budgets = [BudgetWithCategory {
            budget: Budget {
                id: 1,
                user_id: UserId::new(1),
                category_id: 10,
                month: date!(2025 - 06 - 01),
                amount: "400.00".parse().unwrap(),
            },
            category_name: "Groceries".to_owned(),
        }];

        let result = budget_vs_actual(today, &budgets, &[]);

        assert_eq!(result.spent, vec![0.0]);
    }
}
