//! Chinese currency, amount, and date formatting

use crate::{Result, RmbTextError};
use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Financial (capital) numerals 0-9
const NUMERALS: [&str; 10] = ["零", "壹", "贰", "叁", "肆", "伍", "陆", "柒", "捌", "玖"];

/// Unit for each digit position inside a four-digit section
const DIGIT_UNITS: [&str; 4] = ["", "拾", "佰", "仟"];

/// Marker closing each four-digit section (10^4 steps).
///
/// Eight sections cover the 29 integer digits a `Decimal` can hold.
const SECTION_UNITS: [&str; 8] = ["", "万", "亿", "兆", "京", "垓", "秭", "穰"];

const CURRENCY_UNIT: &str = "元";
const JIAO: &str = "角";
const FEN: &str = "分";
const EXACT: &str = "整";
const NEGATIVE: &str = "负";

/// Bias added to float input before rounding, absorbs binary representation error
const FLOAT_EPSILON: f64 = 0.000_000_1;

/// Chinese currency text formatting utilities
pub struct RmbFormatter;

impl RmbFormatter {
    /// Format an amount as capital-numeral currency text
    pub fn format_upper(amount: Decimal) -> String {
        format_rmb_upper(amount)
    }

    /// Format a float amount as capital-numeral currency text
    pub fn format_upper_f64(amount: f64) -> String {
        format_rmb_upper_f64(amount)
    }

    /// Format an amount with exactly two fractional digits
    pub fn format_amount(amount: Decimal) -> String {
        format_amount(amount)
    }

    /// Format a date as a Chinese date label
    pub fn format_date(date: NaiveDate) -> String {
        format_cn_date(date)
    }
}

/// Format an amount as capital-numeral currency text
///
/// The amount is rounded to fen (two fractional digits, half away from zero)
/// before conversion.
///
/// # Examples
/// ```
/// use rmb_text::format_rmb_upper;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_rmb_upper(Decimal::new(123456, 2)), "壹仟贰佰叁拾肆元伍角陆分");
/// assert_eq!(format_rmb_upper(Decimal::new(10000, 2)), "壹佰元整");
/// assert_eq!(format_rmb_upper(Decimal::ZERO), "零元整");
/// ```
pub fn format_rmb_upper(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let magnitude = rounded.abs();

    let integer = magnitude.trunc();
    let cents = ((magnitude - integer) * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u32()
        .unwrap_or(0);

    let mut result = String::new();
    if negative {
        result.push_str(NEGATIVE);
    }

    result.push_str(&integer_to_words(&integer.to_string()));
    result.push_str(CURRENCY_UNIT);

    let (jiao, fen) = ((cents / 10) as usize, (cents % 10) as usize);
    if jiao == 0 && fen == 0 {
        result.push_str(EXACT);
    } else {
        if jiao > 0 {
            result.push_str(NUMERALS[jiao]);
            result.push_str(JIAO);
        }
        if fen > 0 {
            result.push_str(NUMERALS[fen]);
            result.push_str(FEN);
        }
    }

    result
}

/// Format a float amount as capital-numeral currency text
///
/// A small bias pushes the value away from zero before rounding so that
/// values like `0.125` stored as `0.12499999...` still round up.
/// Non-finite or out-of-range input renders as an empty string.
pub fn format_rmb_upper_f64(amount: f64) -> String {
    if !amount.is_finite() {
        return String::new();
    }

    let biased = if amount < 0.0 {
        amount - FLOAT_EPSILON
    } else {
        amount + FLOAT_EPSILON
    };

    Decimal::from_f64(biased)
        .map(format_rmb_upper)
        .unwrap_or_default()
}

/// Convert the decimal digits of a non-negative integer to numerals with units
///
/// Single pass from the most significant digit. A zero digit only raises the
/// pending-zero flag; the flag emits one `零` right before the next non-zero
/// digit, so runs of zeros collapse and trailing zeros vanish. A section
/// marker is written only when its section holds a non-zero digit.
fn integer_to_words(digits: &str) -> String {
    let digits: Vec<usize> = digits
        .split('.')
        .next()
        .unwrap_or_default()
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| (b - b'0') as usize)
        .collect();

    let len = digits.len();
    let mut result = String::new();
    let mut pending_zero = false;
    let mut section_has_digit = false;

    for (i, &digit) in digits.iter().enumerate() {
        let position = len - 1 - i;
        let unit_index = position % 4;
        let section_index = position / 4;

        if digit == 0 {
            // Leading zeros never count
            if !result.is_empty() {
                pending_zero = true;
            }
        } else {
            if pending_zero {
                result.push_str(NUMERALS[0]);
                pending_zero = false;
            }
            result.push_str(NUMERALS[digit]);
            result.push_str(DIGIT_UNITS[unit_index]);
            section_has_digit = true;
        }

        if unit_index == 0 {
            if section_has_digit && section_index > 0 {
                result.push_str(SECTION_UNITS[section_index.min(SECTION_UNITS.len() - 1)]);
            }
            section_has_digit = false;
        }
    }

    if result.is_empty() {
        NUMERALS[0].to_string()
    } else {
        result
    }
}

/// Format an amount with exactly two fractional digits
///
/// # Examples
/// ```
/// use rmb_text::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(5, 1)), "0.50");
/// assert_eq!(format_amount(Decimal::new(12, 0)), "12.00");
/// ```
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// Parse an amount string with at most two fractional digits
///
/// # Examples
/// ```
/// use rmb_text::parse_amount;
///
/// assert!(parse_amount("12.50").is_ok());
/// assert!(parse_amount("1.005").is_err());
/// assert!(parse_amount("abc").is_err());
/// ```
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let trimmed = s.trim();
    let amount = Decimal::from_str(trimmed)
        .map_err(|e| RmbTextError::InvalidAmount(format!("{trimmed}: {e}")))?;

    if amount.scale() > 2 {
        return Err(RmbTextError::InvalidAmount(format!(
            "{trimmed}: more than 2 fractional digits"
        )));
    }

    Ok(amount)
}

/// Format a date as a Chinese date label (e.g., "2025年01月22日")
pub fn format_cn_date(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_rmb_upper_zero() {
        assert_eq!(format_rmb_upper(Decimal::ZERO), "零元整");
        assert_eq!(format_rmb_upper(dec("0.00")), "零元整");
        assert_eq!(format_rmb_upper(dec("-0.001")), "零元整");
    }

    #[test]
    fn test_format_rmb_upper_fraction_only() {
        assert_eq!(format_rmb_upper(dec("0.5")), "零元伍角");
        assert_eq!(format_rmb_upper(dec("0.05")), "零元伍分");
        assert_eq!(format_rmb_upper(dec("0.56")), "零元伍角陆分");
    }

    #[test]
    fn test_format_rmb_upper_basic() {
        assert_eq!(format_rmb_upper(dec("1")), "壹元整");
        assert_eq!(format_rmb_upper(dec("9.90")), "玖元玖角");
        assert_eq!(format_rmb_upper(dec("1234.56")), "壹仟贰佰叁拾肆元伍角陆分");
        assert_eq!(format_rmb_upper(dec("1.05")), "壹元伍分");
    }

    #[test]
    fn test_format_rmb_upper_trailing_zeros_keep_unit() {
        assert_eq!(format_rmb_upper(dec("10")), "壹拾元整");
        assert_eq!(format_rmb_upper(dec("100.00")), "壹佰元整");
        assert_eq!(format_rmb_upper(dec("1000")), "壹仟元整");
        assert_eq!(format_rmb_upper(dec("120.30")), "壹佰贰拾元叁角");
    }

    #[test]
    fn test_format_rmb_upper_internal_zeros() {
        assert_eq!(format_rmb_upper(dec("1002.00")), "壹仟零贰元整");
        assert_eq!(format_rmb_upper(dec("1010")), "壹仟零壹拾元整");
        assert_eq!(format_rmb_upper(dec("100001")), "壹拾万零壹元整");
        assert_eq!(format_rmb_upper(dec("10010")), "壹万零壹拾元整");
    }

    #[test]
    fn test_format_rmb_upper_sections() {
        assert_eq!(format_rmb_upper(dec("10000")), "壹万元整");
        assert_eq!(format_rmb_upper(dec("100000")), "壹拾万元整");
        assert_eq!(format_rmb_upper(dec("12345678")), "壹仟贰佰叁拾肆万伍仟陆佰柒拾捌元整");
        assert_eq!(format_rmb_upper(dec("100000000")), "壹亿元整");
        assert_eq!(format_rmb_upper(dec("100010000")), "壹亿零壹万元整");
        assert_eq!(format_rmb_upper(dec("100100000")), "壹亿零壹拾万元整");
    }

    #[test]
    fn test_format_rmb_upper_very_large() {
        let max = Decimal::MAX.trunc();
        let words = format_rmb_upper(max);
        assert!(words.starts_with("柒穰"));
        assert!(words.ends_with("元整"));
    }

    #[test]
    fn test_format_rmb_upper_negative() {
        assert_eq!(format_rmb_upper(dec("-12.30")), "负壹拾贰元叁角");
        assert_eq!(format_rmb_upper(dec("-0.5")), "负零元伍角");
    }

    #[test]
    fn test_format_rmb_upper_rounds_to_fen() {
        assert_eq!(format_rmb_upper(dec("0.125")), "零元壹角叁分");
        assert_eq!(format_rmb_upper(dec("0.994")), "零元玖角玖分");
        assert_eq!(format_rmb_upper(dec("0.995")), "壹元整");
    }

    #[test]
    fn test_format_rmb_upper_is_stable_under_reformatting() {
        let amount = dec("1234.5");
        let reformatted = dec(&format_amount(amount));
        assert_eq!(format_rmb_upper(amount), format_rmb_upper(reformatted));
    }

    #[test]
    fn test_format_rmb_upper_f64() {
        assert_eq!(format_rmb_upper_f64(0.1 + 0.2), "零元叁角");
        assert_eq!(format_rmb_upper_f64(1234.56), "壹仟贰佰叁拾肆元伍角陆分");
        assert_eq!(format_rmb_upper_f64(-1.5), "负壹元伍角");
        assert_eq!(format_rmb_upper_f64(f64::NAN), "");
        assert_eq!(format_rmb_upper_f64(f64::INFINITY), "");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("0")), "0.00");
        assert_eq!(format_amount(dec("-0.001")), "0.00");
        assert_eq!(format_amount(dec("3.5")), "3.50");
        assert_eq!(format_amount(dec("1234.567")), "1234.57");
        assert_eq!(format_amount(dec("0.1") + dec("0.2")), "0.30");
        assert_eq!(format_amount(dec("-7.2")), "-7.20");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.5 ").unwrap(), dec("12.5"));
        assert_eq!(parse_amount("-3").unwrap(), dec("-3"));
        assert!(parse_amount("12.345").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("twelve").is_err());
    }

    #[test]
    fn test_format_cn_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();
        assert_eq!(format_cn_date(date), "2025年01月22日");
    }

    #[test]
    fn test_integer_to_words() {
        assert_eq!(integer_to_words("0"), "零");
        assert_eq!(integer_to_words("000"), "零");
        assert_eq!(integer_to_words("7"), "柒");
        assert_eq!(integer_to_words("20"), "贰拾");
        assert_eq!(integer_to_words("10000001"), "壹仟万零壹");
    }
}
