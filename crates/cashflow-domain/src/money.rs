//! Fixed-point money helpers.

use rust_decimal::Decimal;

use crate::DomainError;

/// Fractional digits carried by every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to the stored precision.
pub fn normalize_amount(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// Ensures a rule or exception amount is a positive magnitude.
pub fn ensure_positive(amount: Decimal) -> Result<Decimal, DomainError> {
    let normalized = normalize_amount(amount);
    if normalized <= Decimal::ZERO {
        return Err(DomainError::NonPositiveAmount);
    }
    Ok(normalized)
}

/// Upper-cases and validates a 3-letter ISO style currency code.
pub fn normalize_currency(code: &str) -> Result<String, DomainError> {
    let trimmed = code.trim();
    if trimmed.len() != 3 || !trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(DomainError::InvalidCurrency(code.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn currency_codes_are_uppercased() {
        assert_eq!(normalize_currency(" eur ").unwrap(), "EUR");
        assert!(normalize_currency("EURO").is_err());
        assert!(normalize_currency("U$D").is_err());
    }

    #[test]
    fn amounts_must_be_positive() {
        assert_eq!(
            ensure_positive(Decimal::from_str("10.005").unwrap()).unwrap(),
            Decimal::from_str("10.00").unwrap()
        );
        assert_eq!(
            ensure_positive(Decimal::ZERO),
            Err(DomainError::NonPositiveAmount)
        );
        assert!(ensure_positive(Decimal::from_str("-3").unwrap()).is_err());
    }
}
