//! Conversions between display amounts and token base units.

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("amount {0} is negative")]
    Negative(Decimal),
    #[error("amount {amount} overflows at {decimals} decimals")]
    Overflow { amount: Decimal, decimals: u8 },
}

fn scale(amount: Decimal, decimals: u8) -> Result<Decimal, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative(amount));
    }
    let factor = 10u64
        .checked_pow(u32::from(decimals))
        .map(Decimal::from)
        .ok_or(UnitsError::Overflow { amount, decimals })?;
    amount
        .checked_mul(factor)
        .ok_or(UnitsError::Overflow { amount, decimals })
}

fn to_u256(scaled: Decimal, amount: Decimal, decimals: u8) -> Result<U256, UnitsError> {
    scaled
        .to_u128()
        .map(U256::from)
        .ok_or(UnitsError::Overflow { amount, decimals })
}

/// `amount * 10^decimals`, rounded half-up to the nearest base unit.
pub fn to_base_units_rounded(amount: Decimal, decimals: u8) -> Result<U256, UnitsError> {
    let scaled =
        scale(amount, decimals)?.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    to_u256(scaled, amount, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amounts_scale_exactly() {
        assert_eq!(
            to_base_units_rounded(Decimal::new(1250, 2), 6).unwrap(),
            U256::from(12_500_000u64)
        );
        assert_eq!(to_base_units_rounded(Decimal::ZERO, 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_rounded_base_units() {
        assert_eq!(
            to_base_units_rounded(Decimal::new(15, 7), 6).unwrap(),
            U256::from(2u64)
        );
        assert_eq!(
            to_base_units_rounded(Decimal::new(14, 7), 6).unwrap(),
            U256::from(1u64)
        );
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        assert!(matches!(
            to_base_units_rounded(Decimal::NEGATIVE_ONE, 6),
            Err(UnitsError::Negative(_))
        ));
    }
}
