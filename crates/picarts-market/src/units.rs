//! Ether amounts and their conversion to the contracts' 18-decimal unit.

use std::fmt;
use std::str::FromStr;

use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};

use crate::error::{MarketError, Result};

/// Decimal places of the native unit.
pub const ETHER_DECIMALS: usize = 18;

/// Whole-ether digits accepted before the conversion could overflow 256 bits.
const MAX_WHOLE_DIGITS: usize = 50;

/// A positive or zero amount in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(U256);

impl Price {
    pub fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    pub fn wei(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parses a user-entered ether amount such as `"0.5"` or `"12"`.
    ///
    /// Rejects empty, non-numeric, negative, zero and over-precise inputs
    /// with [`MarketError::InvalidPrice`] before any conversion happens.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MarketError::invalid_price(input, "enter a price in ether"));
        }

        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(MarketError::invalid_price(input, "not a decimal number"));
        }
        if fraction.len() > ETHER_DECIMALS {
            return Err(MarketError::invalid_price(
                input,
                "more than 18 decimal places",
            ));
        }
        if whole.trim_start_matches('0').len() > MAX_WHOLE_DIGITS {
            return Err(MarketError::invalid_price(input, "amount too large"));
        }

        let wei = parse_ether(trimmed)
            .map_err(|_| MarketError::invalid_price(input, "amount out of range"))?;
        if wei.is_zero() {
            return Err(MarketError::invalid_price(input, "must be greater than zero"));
        }
        Ok(Self(wei))
    }

    /// Formats as a decimal ether string without trailing zeros (`"0.5"`, `"2"`).
    pub fn to_ether_string(&self) -> String {
        let formatted = format_ether(self.0);
        match formatted.split_once('.') {
            Some((whole, fraction)) => {
                let fraction = fraction.trim_end_matches('0');
                if fraction.is_empty() {
                    whole.to_string()
                } else {
                    format!("{whole}.{fraction}")
                }
            }
            None => formatted,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ether_string())
    }
}

impl FromStr for Price {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
