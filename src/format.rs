use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Two decimals with thousands separators, e.g. `-12,345.60`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

pub fn format_amount_with_currency(amount: Decimal, currency: &str) -> String {
    format!("{} {}", format_amount(amount), currency)
}

/// Percentage with two decimals.
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_amount(value))
}

/// Local wall-clock rendering used in tables.
pub fn format_datetime(value: &DateTime<Utc>, offset: &FixedOffset) -> String {
    value
        .with_timezone(offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(12.5)), "12.50");
        assert_eq!(format_amount(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_amount(dec!(-9876.005)), "-9,876.01");
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
        assert_eq!(format_amount(dec!(100)), "100.00");
    }

    #[test]
    fn test_format_percent_and_currency() {
        assert_eq!(format_percent(dec!(4.5)), "4.50%");
        assert_eq!(format_amount_with_currency(dec!(2500), "INR"), "2,500.00 INR");
    }

    #[test]
    fn test_format_datetime_in_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
        let ist = FixedOffset::east_opt(19800).unwrap();
        assert_eq!(format_datetime(&ts, &ist), "2024-03-11 01:30:00");
    }
}
