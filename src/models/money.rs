//! Money type for representing currency amounts
//!
//! A [`Money`] is an amount paired with an ISO-style currency code. The amount
//! is always held at two decimal places (rounded half-to-even on the way in),
//! and every operation that combines two values checks that their currencies
//! agree. Allocation works in whole cents so that the parts of a split always
//! add back up to the original amount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{BudgetError, BudgetResult};

/// Number of decimal places every amount is held at
const SCALE: u32 = 2;

/// Most shares one allocation may produce
pub const MAX_ALLOCATION_PARTS: usize = 10_000;

/// An immutable amount of money in a single currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMoney", into = "RawMoney")]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    /// Create a money value, rounding to cents with banker's rounding
    ///
    /// The currency is trimmed and upper-cased. A blank currency is rejected.
    ///
    /// # Examples
    /// ```
    /// use budget_core::models::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// let m = Money::new(dec!(100.125), "zar").unwrap();
    /// assert_eq!(m.amount(), dec!(100.12));
    /// assert_eq!(m.currency(), "ZAR");
    /// ```
    pub fn new(amount: Decimal, currency: &str) -> BudgetResult<Self> {
        let currency = currency.trim();
        if currency.is_empty() {
            return Err(BudgetError::EmptyCurrency);
        }
        Ok(Self::from_parts(amount, currency.to_uppercase()))
    }

    /// Create a zero amount in the given currency
    pub fn zero(currency: &str) -> BudgetResult<Self> {
        Self::new(Decimal::ZERO, currency)
    }

    /// Parse an amount such as "12.50" or "-3" in the given currency
    pub fn parse(amount: &str, currency: &str) -> BudgetResult<Self> {
        let trimmed = amount.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|_| BudgetError::InvalidAmount(format!("'{}' is not a number", trimmed)))?;
        Self::new(value, currency)
    }

    fn from_parts(amount: Decimal, currency: String) -> Self {
        let mut amount = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointNearestEven);
        // keep a fixed scale so "5" and "5.00" serialize the same way
        amount.rescale(SCALE);
        Self { amount, currency }
    }

    fn from_cents(cents: i128, currency: &str) -> Self {
        Self::from_parts(Decimal::from_i128_with_scale(cents, SCALE), currency.to_string())
    }

    /// The rounded amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The upper-case currency code
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The amount as a whole number of cents
    pub fn cents(&self) -> BudgetResult<i128> {
        self.amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.trunc().to_i128())
            .ok_or_else(|| {
                BudgetError::InvalidAmount(format!("{} is too large to express in cents", self))
            })
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Get the absolute value
    pub fn abs(&self) -> Self {
        Self::from_parts(self.amount.abs(), self.currency.clone())
    }

    /// Flip the sign of the amount
    pub fn negate(&self) -> Self {
        Self::from_parts(-self.amount, self.currency.clone())
    }

    /// Check that `other` is in the same currency as `self`
    pub fn ensure_same_currency(&self, other: &Money) -> BudgetResult<()> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(BudgetError::CurrencyMismatch {
                expected: self.currency.clone(),
                actual: other.currency.clone(),
            })
        }
    }

    /// Add two amounts of the same currency
    pub fn try_add(&self, other: &Money) -> BudgetResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Self::from_parts(self.amount + other.amount, self.currency.clone()))
    }

    /// Subtract an amount of the same currency
    pub fn try_subtract(&self, other: &Money) -> BudgetResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Self::from_parts(self.amount - other.amount, self.currency.clone()))
    }

    /// Scale the amount; the result is re-rounded to cents
    pub fn multiply(&self, factor: Decimal) -> Money {
        Self::from_parts(self.amount * factor, self.currency.clone())
    }

    /// Divide the amount; the result is re-rounded to cents
    pub fn divide(&self, divisor: Decimal) -> BudgetResult<Money> {
        if divisor.is_zero() {
            return Err(BudgetError::DivisionByZero);
        }
        let quotient = self
            .amount
            .checked_div(divisor)
            .ok_or_else(|| BudgetError::InvalidAmount(format!("{} / {} overflows", self, divisor)))?;
        Ok(Self::from_parts(quotient, self.currency.clone()))
    }

    /// Compare two amounts of the same currency
    ///
    /// # Panics
    ///
    /// Panics when the currencies differ. Comparing amounts in different
    /// currencies is a programming error, not a business-rule failure.
    pub fn compare_to(&self, other: &Money) -> Ordering {
        assert!(
            self.currency == other.currency,
            "cannot compare {} with {}: currency mismatch",
            self.currency,
            other.currency
        );
        self.amount.cmp(&other.amount)
    }

    /// Sum a sequence of amounts, all of which must be in `currency`
    pub fn sum<'a, I>(currency: &str, amounts: I) -> BudgetResult<Money>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency)?, |total, m| total.try_add(m))
    }

    /// Split into `parts` equal shares that add up to exactly this amount
    ///
    /// Leftover cents go one each to the first shares, so no two shares
    /// differ by more than one cent.
    ///
    /// # Examples
    /// ```
    /// use budget_core::models::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// let shares = Money::new(dec!(10.00), "USD").unwrap().allocate(3).unwrap();
    /// let amounts: Vec<_> = shares.iter().map(|m| m.amount()).collect();
    /// assert_eq!(amounts, vec![dec!(3.34), dec!(3.33), dec!(3.33)]);
    /// ```
    pub fn allocate(&self, parts: i32) -> BudgetResult<Vec<Money>> {
        if parts <= 0 {
            return Err(BudgetError::InvalidAllocation(format!(
                "number of parts must be greater than zero, got {}",
                parts
            )));
        }
        if parts as usize > MAX_ALLOCATION_PARTS {
            return Err(BudgetError::InvalidAllocation(format!(
                "cannot split into more than {} parts, got {}",
                MAX_ALLOCATION_PARTS, parts
            )));
        }

        let (sign, magnitude) = self.signed_cents()?;
        let parts = i128::from(parts);
        let base = magnitude / parts;
        let remainder = magnitude % parts;

        Ok((0..parts)
            .map(|i| {
                let share = if i < remainder { base + 1 } else { base };
                Self::from_cents(sign * share, &self.currency)
            })
            .collect())
    }

    /// Split in proportion to `ratios`, adding up to exactly this amount
    ///
    /// Each share is rounded down to the cent except the last non-zero one,
    /// which takes whatever is left. Zero ratios receive a zero share.
    pub fn allocate_by_ratios(&self, ratios: &[i32]) -> BudgetResult<Vec<Money>> {
        if ratios.is_empty() {
            return Err(BudgetError::InvalidAllocation(
                "at least one ratio is required".into(),
            ));
        }
        if ratios.len() > MAX_ALLOCATION_PARTS {
            return Err(BudgetError::InvalidAllocation(format!(
                "cannot split into more than {} parts, got {}",
                MAX_ALLOCATION_PARTS,
                ratios.len()
            )));
        }
        if ratios.iter().any(|&r| r < 0) {
            return Err(BudgetError::InvalidAllocation(
                "ratios cannot be negative".into(),
            ));
        }
        let total: i128 = ratios.iter().map(|&r| i128::from(r)).sum();
        if total == 0 {
            return Err(BudgetError::InvalidAllocation(
                "at least one ratio must be greater than zero".into(),
            ));
        }

        let (sign, magnitude) = self.signed_cents()?;
        // total > 0 guarantees a positive ratio exists
        let last = ratios.iter().rposition(|&r| r > 0).unwrap_or(ratios.len() - 1);

        let mut allocated: i128 = 0;
        let mut shares = Vec::with_capacity(ratios.len());
        for (i, &ratio) in ratios.iter().enumerate() {
            let share = if ratio == 0 {
                0
            } else if i == last {
                magnitude - allocated
            } else {
                magnitude
                    .checked_mul(i128::from(ratio))
                    .map(|scaled| scaled / total)
                    .ok_or_else(|| {
                        BudgetError::InvalidAllocation(format!("{} is too large to split", self))
                    })?
            };
            allocated += share;
            shares.push(Self::from_cents(sign * share, &self.currency));
        }

        Ok(shares)
    }

    /// Cents split into sign and magnitude so negative amounts split symmetrically
    fn signed_cents(&self) -> BudgetResult<(i128, i128)> {
        let cents = self.cents()?;
        Ok((if cents < 0 { -1 } else { 1 }, cents.abs()))
    }
}

impl PartialOrd for Money {
    /// # Panics
    ///
    /// Panics on currency mismatch, see [`Money::compare_to`].
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare_to(other))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}

/// Wire shape of [`Money`]; deserializing goes back through [`Money::new`]
#[derive(Serialize, Deserialize)]
struct RawMoney {
    amount: Decimal,
    currency: String,
}

impl TryFrom<RawMoney> for Money {
    type Error = BudgetError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::new(raw.amount, &raw.currency)
    }
}

impl From<Money> for RawMoney {
    fn from(money: Money) -> Self {
        Self {
            amount: money.amount,
            currency: money.currency,
        }
    }
}
