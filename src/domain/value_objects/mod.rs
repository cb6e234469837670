//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coupon code value object. Codes are trimmed and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(ValueError::EmptyCode);
        }
        if value.len() > 64 {
            return Err(ValueError::CodeTooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = ValueError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

/// Monetary amount, always held at two decimal places (round half up).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(round_cents(amount))
    }

    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn add(self, other: Money) -> Money {
        Money::new(self.0 + other.0)
    }

    pub fn subtract(self, other: Money) -> Money {
        Money::new(self.0 - other.0)
    }

    pub fn multiply(self, qty: Quantity) -> Money {
        Money::new(self.0 * Decimal::from(qty.value()))
    }

    /// `pct` percent of this amount.
    pub fn percent(self, pct: Decimal) -> Money {
        Money::new(self.0 * pct / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::add)
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole percentage between 0 and 100 inclusive.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub struct Percentage(u8);

impl Percentage {
    pub const NONE: Percentage = Percentage(0);

    pub fn new(value: i32) -> Result<Self, ValueError> {
        if !(0..=100).contains(&value) {
            return Err(ValueError::PercentageOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Price left after taking this percentage off.
    pub fn off(&self, price: Money) -> Money {
        let remaining = Decimal::ONE_HUNDRED - Decimal::from(self.0);
        Money::new(price.amount() * remaining / Decimal::ONE_HUNDRED)
    }
}

impl TryFrom<i32> for Percentage {
    type Error = ValueError;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for i32 {
    fn from(p: Percentage) -> Self {
        p.0 as i32
    }
}

/// Ordered or carted quantity, between 1 and `i32::MAX` so it always fits
/// an `INTEGER` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u32);

impl Quantity {
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: i64) -> Result<Self, ValueError> {
        match u32::try_from(value) {
            Ok(v) if v > 0 && v <= Self::MAX => Ok(Self(v)),
            _ => Err(ValueError::InvalidQuantity(value)),
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Sum of both quantities, capped at [`Quantity::MAX`].
    pub fn add(&self, other: Quantity) -> Self {
        Self(self.0.saturating_add(other.0).min(Self::MAX))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = ValueError;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(q: Quantity) -> Self {
        q.0 as i64
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0 as i32
    }
}

/// The trimmed value, or `None` when it is absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

/// Trims `input` and escapes the characters HTML gives meaning to.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Phone numbers may carry any punctuation but must hold 7 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    EmptyCode,
    CodeTooLong,
    PercentageOutOfRange(i32),
    InvalidQuantity(i64),
}

impl std::error::Error for ValueError {}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "coupon code is required"),
            Self::CodeTooLong => write!(f, "coupon code too long"),
            Self::PercentageOutOfRange(v) => {
                write!(f, "percentage must be between 0 and 100, got {}", v)
            }
            Self::InvalidQuantity(v) => write!(f, "quantity must be at least 1, got {}", v),
        }
    }
}
