use std::fmt;

use rust_decimal::Decimal;

/// Money is held as an exact base-10 decimal so that subtraction and division
/// never pick up binary floating-point noise.
pub type Amount = Decimal;

/// Format an amount with two decimal places.
/// Example: 50 -> "50.00", -12.3 -> "-12.30"
pub fn format_amount(amount: Amount) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Format an evolution ratio as a signed percentage.
/// Example: 0.5 -> "+50.00%", -0.142857 -> "-14.29%"
pub fn format_ratio(ratio: Decimal) -> String {
    let percent = ratio.saturating_mul(Decimal::ONE_HUNDRED).round_dp(2);
    let sign = if percent.is_sign_positive() && !percent.is_zero() {
        "+"
    } else {
        ""
    };
    format!("{}{:.2}%", sign, percent)
}

/// Parse a decimal string into an exact amount.
/// Accepts "1234.56", "-12", ".5", "1_000.00" and a comma as decimal separator ("12,50").
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let mut normalized: String = input
        .chars()
        .filter(|c| *c != '_' && *c != ' ')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if normalized.matches('.').count() > 1 {
        return Err(ParseAmountError::InvalidFormat(input.to_string()));
    }

    // Bare fractions like ".5" or "-.5"
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    } else if normalized.starts_with("-.") {
        normalized.insert(1, '0');
    }

    Decimal::from_str_exact(&normalized)
        .map_err(|_| ParseAmountError::InvalidFormat(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat(String),
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "empty amount"),
            ParseAmountError::InvalidFormat(s) => write!(f, "invalid amount format: '{}'", s),
        }
    }
}

impl std::error::Error for ParseAmountError {}
