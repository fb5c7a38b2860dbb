//! # Money Module
//!
//! Fixed-precision monetary arithmetic for the register.
//!
//! ## Integer Minor Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  All monetary values are integer cents (i64).                       │
//! │                                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004   ← what floats would give us    │
//! │    10 + 20   = 30 cents              ← what we actually compute     │
//! │                                                                     │
//! │  Derived amounts (tax, discounts, currency conversion) round        │
//! │  half-up exactly ONCE, at the point the amount is produced.         │
//! │  Intermediate math is widened to i128 so it never overflows.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rates follow the same discipline: [`TaxRate`] is basis points,
//! [`ExchangeRate`] and [`LoyaltyRate`] are scaled by 10^4. No floats
//! ever participate in money math.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design
/// - **i64 (signed)**: negative values represent refunds and shortfalls
/// - **Single-field tuple struct**: zero-cost abstraction over i64
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
///
/// let price = Money::from_cents(1099); // 10.99
/// let total = price + Money::from_cents(500);
/// assert_eq!(total.cents(), 1599);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50, not -4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of two amounts.
    #[inline]
    pub const fn max(self, other: Self) -> Self {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// Calculates tax on this amount.
    ///
    /// Rounding happens once, half-up: `(amount * bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{Money, TaxRate};
    ///
    /// let net = Money::from_cents(2500);       // 25.00
    /// let tax = net.tax_at(TaxRate::from_bps(1000)); // 10%
    /// assert_eq!(tax.cents(), 250);            // 2.50
    /// ```
    pub fn tax_at(&self, rate: TaxRate) -> Money {
        // i128 intermediate so large amounts cannot overflow
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Display for logs and test output. Receipt rendering formats money
/// itself so it can carry the configured currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (bps). 1 bps = 0.01%, so 825 = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Exchange rate between the primary and a secondary tender currency.
///
/// Stored as secondary units per one primary major unit, scaled by 10^4:
/// a rate of 4.5 secondary per primary is `ExchangeRate::from_scaled(45_000)`.
///
/// Conversions round half-up once. A zero rate means no secondary
/// currency is configured; conversions through it yield zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate(u32);

impl ExchangeRate {
    /// Creates a rate from its 10^4-scaled representation.
    #[inline]
    pub const fn from_scaled(scaled: u32) -> Self {
        ExchangeRate(scaled)
    }

    /// 1:1 rate.
    #[inline]
    pub const fn identity() -> Self {
        ExchangeRate(10_000)
    }

    /// Returns the 10^4-scaled rate.
    #[inline]
    pub const fn scaled(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Converts a secondary-currency amount to primary cents.
    ///
    /// `primary = secondary / rate`, rounded half-up.
    pub fn to_primary(&self, secondary: Money) -> Money {
        if self.0 == 0 {
            return Money::zero();
        }
        let rate = self.0 as i128;
        let cents = (secondary.cents() as i128 * 10_000 + rate / 2) / rate;
        Money::from_cents(cents as i64)
    }

    /// Converts a primary-currency amount to secondary cents.
    ///
    /// `secondary = primary * rate`, rounded half-up.
    pub fn to_secondary(&self, primary: Money) -> Money {
        let cents = (primary.cents() as i128 * self.0 as i128 + 5000) / 10_000;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Loyalty Rate
// =============================================================================

/// Loyalty accrual rate: points per primary major unit spent, scaled by
/// 10^4. `from_scaled(10_000)` is one point per unit; accrual floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyRate(u32);

impl LoyaltyRate {
    #[inline]
    pub const fn from_scaled(scaled: u32) -> Self {
        LoyaltyRate(scaled)
    }

    #[inline]
    pub const fn scaled(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        LoyaltyRate(0)
    }

    /// Points earned on a sale total: `floor(total_major * rate)`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{LoyaltyRate, Money};
    ///
    /// let rate = LoyaltyRate::from_scaled(10_000); // 1 point per unit
    /// assert_eq!(rate.points_for(Money::from_cents(2750)), 27);
    /// ```
    pub fn points_for(&self, total: Money) -> i64 {
        if total.cents() <= 0 {
            return 0;
        }
        // total_cents * rate / 10^4 gives scaled points in cents; a further
        // /100 floors to whole points per major unit
        ((total.cents() as i128 * self.0 as i128) / 1_000_000) as i64
    }
}

impl Default for LoyaltyRate {
    fn default() -> Self {
        LoyaltyRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(a.max(b), a);
    }

    #[test]
    fn test_tax_basic() {
        // 10.00 at 10% = 1.00
        let tax = Money::from_cents(1000).tax_at(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 100);
    }

    #[test]
    fn test_tax_rounds_half_up_once() {
        // 10.00 at 8.25% = 0.825 → 0.83
        let tax = Money::from_cents(1000).tax_at(TaxRate::from_bps(825));
        assert_eq!(tax.cents(), 83);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert_eq!(TaxRate::from_percentage(10.0).bps(), 1000);
    }

    #[test]
    fn test_exchange_round_trip_conversions() {
        // 4.5 secondary per primary
        let rate = ExchangeRate::from_scaled(45_000);

        // 45.00 secondary → 10.00 primary
        assert_eq!(rate.to_primary(Money::from_cents(4500)).cents(), 1000);
        // 10.00 primary → 45.00 secondary
        assert_eq!(rate.to_secondary(Money::from_cents(1000)).cents(), 4500);
    }

    #[test]
    fn test_exchange_rounds_half_up() {
        // rate 3.0: 1.00 secondary → 0.3333… → 0.33 primary
        let rate = ExchangeRate::from_scaled(30_000);
        assert_eq!(rate.to_primary(Money::from_cents(100)).cents(), 33);
        // 0.50 secondary → 0.1666… → 0.17 primary
        assert_eq!(rate.to_primary(Money::from_cents(50)).cents(), 17);
    }

    #[test]
    fn test_exchange_zero_rate_yields_zero() {
        let rate = ExchangeRate::from_scaled(0);
        assert!(rate.is_zero());
        assert_eq!(rate.to_primary(Money::from_cents(1000)), Money::zero());
    }

    #[test]
    fn test_loyalty_points_floor() {
        let rate = LoyaltyRate::from_scaled(10_000); // 1 point per unit
        assert_eq!(rate.points_for(Money::from_cents(2750)), 27);
        assert_eq!(rate.points_for(Money::from_cents(99)), 0);
        assert_eq!(rate.points_for(Money::from_cents(-500)), 0);

        // half a point per unit
        let half = LoyaltyRate::from_scaled(5_000);
        assert_eq!(half.points_for(Money::from_cents(2750)), 13);
    }
}
