//! Exact decimal money handling.
//!
//! All ledger amounts are [rust_decimal::Decimal] values with two fraction
//! digits, stored in SQLite as TEXT and summed in Rust. Conversion to `f64`
//! is only allowed at the chart/display boundary via [to_chart_value].

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusqlite::{
    Row,
    types::{FromSqlError, Type},
};

use crate::Error;

/// Money precision: the maximum number of significant digits in an amount.
pub const MAX_DIGITS: u32 = 12;

/// Money precision: the number of fraction digits in an amount.
pub const FRACTION_DIGITS: u32 = 2;

/// Normalize `amount` to two fraction digits and ensure it is positive and
/// within the twelve digit money precision.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] if `amount` is zero or negative, or
/// [Error::AmountTooLarge] if it has more than twelve total digits.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::NonPositiveAmount(amount));
    }

    let amount = amount.round_dp(FRACTION_DIGITS);

    if amount.mantissa().unsigned_abs() >= 10u128.pow(MAX_DIGITS) {
        return Err(Error::AmountTooLarge(amount));
    }

    Ok(amount)
}

/// Serialize `amount` for storage in a TEXT column.
pub fn to_sql_string(amount: Decimal) -> String {
    amount.to_string()
}

/// Read a decimal amount from the TEXT column at `index` of `row`.
///
/// Returns a [rusqlite::Error] so this can be used inside row mapping
/// closures.
pub fn amount_from_row(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    text.parse::<Decimal>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            Box::new(FromSqlError::Other(error.to_string().into())),
        )
    })
}

/// Convert an exact amount to a floating point value for chart display.
///
/// This is the one place where precision loss to binary float is acceptable.
pub fn to_chart_value(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod money_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::Error;

    use super::{to_chart_value, validate_amount};

    #[test]
    fn rejects_zero_amount() {
        let result = validate_amount(Decimal::ZERO);

        assert_eq!(result, Err(Error::NonPositiveAmount(Decimal::ZERO)));
    }

    #[test]
    fn rejects_negative_amount() {
        let amount = Decimal::new(-1050, 2);

        let result = validate_amount(amount);

        assert_eq!(result, Err(Error::NonPositiveAmount(amount)));
    }

    #[test]
    fn rounds_to_two_fraction_digits() {
        let amount = "10.005".parse::<Decimal>().unwrap();

        let result = validate_amount(amount).unwrap();

        assert_eq!(result, "10.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn rejects_amount_with_too_many_digits() {
        let amount = "12345678901.23".parse::<Decimal>().unwrap();

        assert_eq!(validate_amount(amount), Err(Error::AmountTooLarge(amount)));
    }

    #[test]
    fn accepts_amount_at_precision_limit() {
        let amount = "1234567890.12".parse::<Decimal>().unwrap();

        assert_eq!(validate_amount(amount), Ok(amount));
    }

    #[test]
    fn round_trips_through_sql_text() {
        let connection = rusqlite::Connection::open_in_memory().unwrap();
        connection
            .execute_batch("CREATE TABLE t (amount TEXT NOT NULL, date TEXT NOT NULL);")
            .unwrap();
        let amount = "1234.56".parse::<Decimal>().unwrap();

        connection
            .execute(
                "INSERT INTO t (amount, date) VALUES (?1, ?2)",
                (super::to_sql_string(amount), date!(2024 - 05 - 10)),
            )
            .unwrap();
        let got: Decimal = connection
            .query_one("SELECT amount, date FROM t", [], |row| {
                super::amount_from_row(row, 0)
            })
            .unwrap();

        assert_eq!(got, amount);
    }

    #[test]
    fn chart_value_is_close_to_exact_amount() {
        let amount = "19.99".parse::<Decimal>().unwrap();

        assert!((to_chart_value(amount) - 19.99).abs() < 1e-9);
    }
}
