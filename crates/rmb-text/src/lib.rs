//! RMB Text - Chinese currency text processing
//!
//! This crate provides:
//! - Capital-numeral amount-in-words (壹仟贰佰叁拾肆元伍角陆分)
//! - Fixed two-digit amount rendering in decimal arithmetic
//! - Chinese date labels (2025年01月22日)
//!
//! # Example
//!
//! ```ignore
//! use rmb_text::{RmbFormatter, parse_amount};
//!
//! let amount = parse_amount("1234.56")?;
//! let words = RmbFormatter::format_upper(amount); // "壹仟贰佰叁拾肆元伍角陆分"
//! let text = RmbFormatter::format_amount(amount); // "1234.56"
//! ```

mod formatter;

pub use formatter::RmbFormatter;

// Re-export commonly used formatting functions
pub use formatter::{
    format_amount, format_cn_date, format_rmb_upper, format_rmb_upper_f64, parse_amount,
};

use thiserror::Error;

/// Errors that can occur during currency text processing
#[derive(Debug, Error)]
pub enum RmbTextError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Result type for currency text operations
pub type Result<T> = std::result::Result<T, RmbTextError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_format_rmb_upper() {
        assert_eq!(format_rmb_upper(Decimal::ZERO), "零元整");
        assert_eq!(format_rmb_upper(Decimal::new(123456, 2)), "壹仟贰佰叁拾肆元伍角陆分");
        assert_eq!(format_rmb_upper(Decimal::new(5, 1)), "零元伍角");
    }

    #[test]
    fn test_formatter_facade() {
        let amount = parse_amount("100").unwrap();
        assert_eq!(RmbFormatter::format_upper(amount), "壹佰元整");
        assert_eq!(RmbFormatter::format_amount(amount), "100.00");
        assert_eq!(RmbFormatter::format_upper_f64(100.0), "壹佰元整");
    }
}
