//! Legacy → successor conversion.
//!
//! successor_out = floor( legacy_in × ratio_num × 10^(sd − ld) / ratio_den )
//!
//! When the successor has fewer decimals the power of ten moves to the
//! denominator: floor( legacy_in × ratio_num / (ratio_den × 10^(ld − sd)) ).
//! Only the decimal difference is ever applied, so the intermediate product
//! overflows at the same inputs for every implementation. Every step is
//! checked in u128; the remainder is always discarded.

use crate::constants::MAX_DECIMALS;
use crate::error::RedeemerError;
use crate::types::Amount;

/// 10^d in u128, `None` past `MAX_DECIMALS`.
pub fn pow10(d: u8) -> Option<u128> {
    if d > MAX_DECIMALS {
        return None;
    }
    10u128.checked_pow(d as u32)
}

/// Convert a legacy amount to successor base units, truncating.
pub fn convert(
    legacy_in: Amount,
    ratio_num: u64,
    ratio_den: u64,
    legacy_decimals: u8,
    successor_decimals: u8,
) -> Result<Amount, RedeemerError> {
    if ratio_num == 0 || ratio_den == 0 {
        return Err(RedeemerError::InvalidRatio);
    }
    if legacy_decimals > MAX_DECIMALS || successor_decimals > MAX_DECIMALS {
        return Err(RedeemerError::MathOverflow);
    }
    let scaled = (legacy_in as u128)
        .checked_mul(ratio_num as u128)
        .ok_or(RedeemerError::MathOverflow)?;
    let out = if successor_decimals >= legacy_decimals {
        let scale = pow10(successor_decimals - legacy_decimals).ok_or(RedeemerError::MathOverflow)?;
        scaled.checked_mul(scale).ok_or(RedeemerError::MathOverflow)? / ratio_den as u128
    } else {
        let scale = pow10(legacy_decimals - successor_decimals).ok_or(RedeemerError::MathOverflow)?;
        let den = (ratio_den as u128).checked_mul(scale).ok_or(RedeemerError::MathOverflow)?;
        scaled / den
    };
    Amount::try_from(out).map_err(|_| RedeemerError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_to_one_across_six_and_nine_decimals() {
        // 1.0 legacy (6 dp) at 1:10 → 0.1 successor (9 dp).
        assert_eq!(convert(1_000_000, 1, 10, 6, 9).unwrap(), 100_000_000);
    }

    #[test]
    fn remainder_is_truncated_never_rounded_up() {
        // 19 units at 1/10 with equal decimals = 1.9 → 1.
        assert_eq!(convert(19, 1, 10, 6, 6).unwrap(), 1);
        assert_eq!(convert(9, 1, 10, 6, 6).unwrap(), 0);
        // 2/3 ratio: 10 × 2 / 3 = 6.66… → 6.
        assert_eq!(convert(10, 2, 3, 0, 0).unwrap(), 6);
    }

    #[test]
    fn successor_with_fewer_decimals() {
        // 1.5 legacy (9 dp) at 1:1 into 6 dp → 1.5 successor = 1_500_000.
        assert_eq!(convert(1_500_000_000, 1, 1, 9, 6).unwrap(), 1_500_000);
        // Sub-unit dust disappears.
        assert_eq!(convert(999, 1, 1, 9, 6).unwrap(), 0);
    }

    #[test]
    fn result_past_u64_is_overflow() {
        assert_eq!(
            convert(u64::MAX, u64::MAX, 1, 0, 18),
            Err(RedeemerError::MathOverflow)
        );
        assert_eq!(convert(u64::MAX, 2, 1, 0, 0), Err(RedeemerError::MathOverflow));
    }

    #[test]
    fn large_amounts_at_high_precision_do_not_overflow_early() {
        // 15e18 × 50 / 49 at 18 → 18 decimals fits in u64.
        assert_eq!(
            convert(15_000_000_000_000_000_000, 50, 49, 18, 18).unwrap(),
            15_306_122_448_979_591_836
        );
        // Same magnitude going down in precision.
        assert_eq!(
            convert(15_000_000_000_000_000_000, 50, 49, 18, 9).unwrap(),
            15_306_122_448
        );
    }

    #[test]
    fn decimals_above_max_are_rejected() {
        assert_eq!(pow10(MAX_DECIMALS + 1), None);
        assert_eq!(convert(1, 1, 1, 0, 19), Err(RedeemerError::MathOverflow));
        assert_eq!(convert(1, 1, 1, 19, 19), Err(RedeemerError::MathOverflow));
    }

    #[test]
    fn zero_ratio_component_is_invalid() {
        assert_eq!(convert(1, 0, 1, 0, 0), Err(RedeemerError::InvalidRatio));
        assert_eq!(convert(1, 1, 0, 0, 0), Err(RedeemerError::InvalidRatio));
    }
}
