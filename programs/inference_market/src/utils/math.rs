use anchor_lang::prelude::*;
use crate::constants::BPS_DENOMINATOR;
use crate::errors::MarketErrorCode;

/// Computes `amount * numerator / denominator` with a u128 intermediate.
/// Truncates toward zero.
pub fn mul_div(amount: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator != 0, MarketErrorCode::ArithmeticOverflow);
    let value = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(MarketErrorCode::ArithmeticOverflow)?
        .checked_div(denominator as u128)
        .ok_or(MarketErrorCode::ArithmeticOverflow)?;
    u64::try_from(value).map_err(|_| error!(MarketErrorCode::ArithmeticOverflow))
}

/// Scales `amount` by a basis-point multiplier (10000 = 1.0x).
pub fn apply_bps(amount: u64, bps: u64) -> Result<u64> {
    mul_div(amount, bps, BPS_DENOMINATOR)
}

/// Reduces `amount` by `discount_bps` (capped at 100%).
pub fn apply_discount_bps(amount: u64, discount_bps: u16) -> Result<u64> {
    let kept = BPS_DENOMINATOR.saturating_sub(discount_bps as u64);
    apply_bps(amount, kept)
}

pub fn checked_total(unit_price: u64, volume: u64) -> Result<u64> {
    unit_price
        .checked_mul(volume)
        .ok_or(error!(MarketErrorCode::ArithmeticOverflow))
}

/// Clamps a computed price into `[min, max]`.
pub fn clamp_price(price: u64, min: u64, max: u64) -> u64 {
    price.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn apply_bps_scales_exactly() {
        // 0.001 SOL = 1_000_000 lamports
        assert_eq!(apply_bps(1_000_000, 15_000).unwrap(), 1_500_000);
        assert_eq!(apply_bps(1_000_000, 12_500).unwrap(), 1_250_000);
        assert_eq!(apply_bps(1_000_000, 9_000).unwrap(), 900_000);
        assert_eq!(apply_bps(1_000_000, 10_000).unwrap(), 1_000_000);
    }

    #[test]
    fn apply_bps_truncates() {
        assert_eq!(apply_bps(3, 5_000).unwrap(), 1);
        assert_eq!(apply_bps(1, 9_999).unwrap(), 0);
    }

    #[test]
    fn apply_bps_overflow_is_an_error() {
        assert!(apply_bps(u64::MAX, 20_000).is_err());
        assert_eq!(apply_bps(u64::MAX, 10_000).unwrap(), u64::MAX);
    }

    #[test]
    fn discount_caps_at_full_price() {
        assert_eq!(apply_discount_bps(1_000, 1_000).unwrap(), 900);
        assert_eq!(apply_discount_bps(1_000, 10_000).unwrap(), 0);
        assert_eq!(apply_discount_bps(1_000, u16::MAX).unwrap(), 0);
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        assert!(mul_div(1, 1, 0).is_err());
    }

    #[test]
    fn checked_total_overflow() {
        assert_eq!(checked_total(1_000, 150_000).unwrap(), 150_000_000);
        assert!(checked_total(u64::MAX, 2).is_err());
    }

    proptest! {
        #[test]
        fn multiplier_at_or_above_par_never_discounts(amount in 0u64..u64::MAX / 5, bps in 10_000u64..=50_000) {
            prop_assert!(apply_bps(amount, bps).unwrap() >= amount);
        }

        #[test]
        fn clamp_stays_in_range(price: u64, min in 0u64..1_000, span in 0u64..1_000_000) {
            let max = min + span;
            let clamped = clamp_price(price, min, max);
            prop_assert!(clamped >= min && clamped <= max);
        }
    }
}
