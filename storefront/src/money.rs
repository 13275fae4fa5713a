//! Money and pricing.
//!
//! Amounts are integral paise so arithmetic stays exact. Tier multipliers are
//! held in hundredths (`2.5` is `250`). A total is computed exactly and then
//! rounded half-up to the nearest whole rupee:
//!
//! ```text
//! total = round_half_up(base × multiplier × quantity)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

const PAISE_PER_RUPEE: u64 = 100;

// ============================================================================
// Money Value Object (paise-based to avoid floating point errors)
// ============================================================================

/// An amount of Indian rupees, stored in paise
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero rupees
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from paise
    #[must_use]
    pub const fn from_paise(paise: u64) -> Self {
        Self(paise)
    }

    /// Creates a `Money` value from whole rupees, saturating on overflow
    #[must_use]
    pub const fn from_rupees(rupees: u64) -> Self {
        Self(rupees.saturating_mul(PAISE_PER_RUPEE))
    }

    /// Returns the amount in paise
    #[must_use]
    pub const fn paise(self) -> u64 {
        self.0
    }

    /// Returns the whole-rupee part (rounded down)
    #[must_use]
    pub const fn rupees(self) -> u64 {
        self.0 / PAISE_PER_RUPEE
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Multiplies by a count with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, count: u64) -> Option<Self> {
        match self.0.checked_mul(count) {
            Some(product) => Some(Self(product)),
            None => None,
        }
    }

    /// Adds two amounts, saturating at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

/// Renders as `₹22,500` (Indian digit grouping), with paise only when non-zero
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paise = self.0 % PAISE_PER_RUPEE;
        write!(f, "₹{}", group_indian(self.rupees()))?;
        if paise != 0 {
            write!(f, ".{paise:02}")?;
        }
        Ok(())
    }
}

/// Group digits the Indian way: last three, then pairs (`12,34,567`)
#[must_use]
pub fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

// ============================================================================
// Multiplier
// ============================================================================

/// Tier price multiplier, held exactly in hundredths
///
/// Deserializes from a plain number (`2.5`) and must be positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Multiplier(u32);

impl Multiplier {
    /// The identity multiplier (`×1`)
    pub const ONE: Self = Self(100);

    /// Creates a multiplier from hundredths (`250` is `×2.5`)
    #[must_use]
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    /// Returns the multiplier in hundredths
    #[must_use]
    pub const fn hundredths(self) -> u32 {
        self.0
    }

    /// Checks if the multiplier is strictly positive
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<f64> for Multiplier {
    type Error = String;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value <= 0.0 {
            return Err(format!("multiplier must be positive, got {value}"));
        }
        let scaled = value * 100.0;
        let hundredths = scaled.round();
        if hundredths < 1.0 || hundredths > f64::from(u32::MAX) {
            return Err(format!("multiplier {value} is out of range"));
        }
        // Absorbs binary representation error only (1.1 × 100 = 110.00000000000001)
        if (scaled - hundredths).abs() > 1e-6 {
            return Err(format!("multiplier {value} is finer than hundredths"));
        }
        Ok(Self(hundredths as u32))
    }
}

impl From<Multiplier> for f64 {
    fn from(multiplier: Multiplier) -> Self {
        f64::from(multiplier.0) / 100.0
    }
}

/// Renders as `×2.5`
impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let fraction = self.0 % 100;
        match fraction {
            0 => write!(f, "×{whole}"),
            n if n % 10 == 0 => write!(f, "×{whole}.{}", n / 10),
            n => write!(f, "×{whole}.{n:02}"),
        }
    }
}

// ============================================================================
// Pricing
// ============================================================================

/// `base × multiplier × quantity`, rounded half-up to a whole rupee
///
/// Saturates instead of overflowing; catalog prices are nowhere near the limit.
#[must_use]
pub fn total(base: Money, multiplier: Multiplier, quantity: u32) -> Money {
    // paise × hundredths: one rupee is 100 × 100 units of this product
    let raw = u128::from(base.paise()) * u128::from(multiplier.hundredths()) * u128::from(quantity);
    let units_per_rupee = u128::from(PAISE_PER_RUPEE) * 100;
    let rupees = (raw + units_per_rupee / 2) / units_per_rupee;
    Money::from_rupees(u64::try_from(rupees).unwrap_or(u64::MAX))
}

/// Price of a single ticket at `multiplier`
#[must_use]
pub fn unit_price(base: Money, multiplier: Multiplier) -> Money {
    total(base, multiplier, 1)
}

/// Serde helpers for amounts written as plain rupee numbers (`4500`, `999.5`)
pub mod rupees {
    use super::{Money, PAISE_PER_RUPEE};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Serialize as rupees
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_precision_loss)]
    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        if money.paise() % PAISE_PER_RUPEE == 0 {
            serializer.serialize_u64(money.rupees())
        } else {
            serializer.serialize_f64(money.paise() as f64 / 100.0)
        }
    }

    /// Deserialize from rupees, rounding to the nearest paisa
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite numbers.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() || value < 0.0 || value * 100.0 > u64::MAX as f64 {
            return Err(D::Error::custom(format!("invalid rupee amount {value}")));
        }
        Ok(Money::from_paise((value * 100.0).round() as u64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn vip_pair_at_4500_costs_22500() {
        let vip = Multiplier::from_hundredths(250);
        assert_eq!(total(Money::from_rupees(4500), vip, 2), Money::from_rupees(22_500));
    }

    #[test]
    fn fractional_products_round_half_up() {
        let vip = Multiplier::from_hundredths(250);
        // 999 × 2.5 = 2497.5
        assert_eq!(total(Money::from_rupees(999), vip, 1), Money::from_rupees(2498));
        // 999 × 2.5 × 2 = 4995 exactly
        assert_eq!(total(Money::from_rupees(999), vip, 2), Money::from_rupees(4995));
        // 10.49 × 1 rounds down
        assert_eq!(total(Money::from_paise(1049), Multiplier::ONE, 1), Money::from_rupees(10));
    }

    #[test]
    fn display_uses_indian_grouping() {
        assert_eq!(Money::from_rupees(999).to_string(), "₹999");
        assert_eq!(Money::from_rupees(4500).to_string(), "₹4,500");
        assert_eq!(Money::from_rupees(22_500).to_string(), "₹22,500");
        assert_eq!(Money::from_rupees(1_234_567).to_string(), "₹12,34,567");
        assert_eq!(Money::from_rupees(10_000_000).to_string(), "₹1,00,00,000");
        assert_eq!(Money::from_paise(99_950).to_string(), "₹999.50");
    }

    #[test]
    fn multiplier_display() {
        assert_eq!(Multiplier::ONE.to_string(), "×1");
        assert_eq!(Multiplier::from_hundredths(250).to_string(), "×2.5");
        assert_eq!(Multiplier::from_hundredths(125).to_string(), "×1.25");
    }

    #[test]
    fn multiplier_parses_from_json_number() {
        let m: Multiplier = serde_json::from_str("2.5").unwrap();
        assert_eq!(m.hundredths(), 250);
        let m: Multiplier = serde_json::from_str("1.1").unwrap();
        assert_eq!(m.hundredths(), 110);
        assert!(serde_json::from_str::<Multiplier>("0").is_err());
        assert!(serde_json::from_str::<Multiplier>("-1.5").is_err());
    }

    #[test]
    fn multiplier_finer_than_hundredths_is_rejected() {
        let err = Multiplier::try_from(1.234).unwrap_err();
        assert!(err.contains("finer than hundredths"));
        assert!(serde_json::from_str::<Multiplier>("2.505").is_err());
        assert_eq!(Multiplier::try_from(0.07).unwrap().hundredths(), 7);
    }

    #[test]
    fn checked_arithmetic_detects_overflow() {
        assert_eq!(Money::from_paise(u64::MAX).checked_add(Money::from_paise(1)), None);
        assert_eq!(Money::from_paise(u64::MAX).checked_multiply(2), None);
        assert_eq!(
            Money::from_rupees(2).checked_multiply(3),
            Some(Money::from_rupees(6))
        );
    }

    proptest! {
        #[test]
        fn integral_multipliers_never_round(
            base in 1u64..1_000_000,
            factor in 1u32..=10,
            quantity in 1u32..=10,
        ) {
            let multiplier = Multiplier::from_hundredths(factor * 100);
            let expected = Money::from_rupees(base * u64::from(factor) * u64::from(quantity));
            prop_assert_eq!(total(Money::from_rupees(base), multiplier, quantity), expected);
        }

        #[test]
        fn total_is_within_half_a_rupee_of_exact(
            base_paise in 1u64..100_000_000,
            hundredths in 1u32..1_000,
            quantity in 1u32..=10,
        ) {
            let exact = u128::from(base_paise) * u128::from(hundredths) * u128::from(quantity);
            let rounded = u128::from(total(Money::from_paise(base_paise), Multiplier::from_hundredths(hundredths), quantity).paise()) * 100;
            let diff = rounded.abs_diff(exact);
            prop_assert!(diff <= 5_000);
        }

        #[test]
        fn grouping_round_trips_digits(value in any::<u64>()) {
            let grouped = group_indian(value);
            prop_assert_eq!(grouped.replace(',', ""), value.to_string());
        }
    }
}
