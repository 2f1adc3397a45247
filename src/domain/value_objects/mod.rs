//! Value objects shared across the domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Postal pincode value object: exactly six ASCII digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pincode(String);

impl Pincode {
    pub fn new(value: impl Into<String>) -> Result<Self, PincodeError> {
        let value = value.into().trim().to_string();
        if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PincodeError::Invalid);
        }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone)] pub enum PincodeError { Invalid }
impl std::error::Error for PincodeError {}
impl fmt::Display for PincodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Pincode must be 6 digits") }
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
}

#[derive(Debug, Clone)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

/// Cart line quantity: always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        Ok(Self(value))
    }
    pub fn get(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

#[derive(Debug, Clone)] pub enum QuantityError { Zero }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Quantity must be at least 1") }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn pincode_accepts_six_digits() {
        let pin = Pincode::new("560001").unwrap();
        assert_eq!(pin.as_str(), "560001");
    }
    #[test]
    fn pincode_rejects_short_and_non_numeric() {
        assert!(Pincode::new("1234").is_err());
        assert!(Pincode::new("56000a").is_err());
        assert!(Pincode::new("5600011").is_err());
    }
    #[test]
    fn money_add_and_multiply() {
        let a = Money::new(Decimal::new(100, 0), "INR");
        let b = Money::new(Decimal::new(50, 0), "INR");
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
        assert_eq!(a.multiply(3).amount(), Decimal::new(300, 0));
    }
    #[test]
    fn money_add_rejects_currency_mismatch() {
        let a = Money::new(Decimal::ONE, "INR");
        let b = Money::new(Decimal::ONE, "USD");
        assert!(a.add(&b).is_err());
    }
    #[test]
    fn quantity_rejects_zero() {
        assert!(Quantity::new(0).is_err());
        assert_eq!(Quantity::new(2).unwrap().get(), 2);
    }
}
