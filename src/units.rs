//! Exact conversion between display-denominated amounts and base units.
//!
//! All conversions go through `BigUint`; amounts never pass through a
//! floating-point representation, so financial figures do not drift.
//!
//! # Supported Units
//!
//! - **`Ether`**: the ether-like display unit, 18 decimals
//! - **`Spark`**: the platform unit, a fixed multiple of 1e14 wei
//! - **`Wei`**: base units themselves

use crate::errors::{InputError, Result};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit an amount is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
    Ether,
    Spark,
    Wei,
}

impl Unit {
    /// Number of decimal places between this unit and wei.
    pub const fn decimals(self) -> u32 {
        match self {
            Unit::Ether => 18,
            Unit::Spark => 14,
            Unit::Wei => 0,
        }
    }

    /// How many wei make up one of this unit.
    pub fn wei_multiplier(self) -> BigUint {
        BigUint::from(10u32).pow(self.decimals())
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::Ether => "ETH",
            Unit::Spark => "SPARK",
            Unit::Wei => "WEI",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn invalid(input: &str, reason: impl Into<String>) -> InputError {
    InputError::InvalidAmount {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parse a non-negative decimal string denominated in `unit` into wei.
///
/// Accepts `digits`, `digits.digits`, `.digits` and `digits.` forms.
/// Fractional digits beyond the unit's precision are rejected unless they
/// are zeros, since they could not be represented without truncation.
pub fn parse_base_units(amount: &str, unit: Unit) -> Result<BigUint> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(invalid(amount, "amount is empty").into());
    }
    if trimmed.starts_with('-') {
        return Err(invalid(amount, "negative amounts are not allowed").into());
    }

    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid(amount, "no digits").into());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid(amount, "not a decimal number").into());
    }

    let frac_part = frac_part.trim_end_matches('0');
    let decimals = unit.decimals() as usize;
    if frac_part.len() > decimals {
        return Err(invalid(
            amount,
            format!("more than {} fractional digits for {}", decimals, unit),
        )
        .into());
    }

    let whole = if int_part.is_empty() {
        BigUint::zero()
    } else {
        int_part
            .parse::<BigUint>()
            .map_err(|e| invalid(amount, e.to_string()))?
    };

    let fraction = if frac_part.is_empty() {
        BigUint::zero()
    } else {
        let padded = format!("{:0<width$}", frac_part, width = decimals);
        padded
            .parse::<BigUint>()
            .map_err(|e| invalid(amount, e.to_string()))?
    };

    Ok(whole * unit.wei_multiplier() + fraction)
}

/// Format a wei amount in `unit` using canonical decimal notation.
///
/// Canonical means no leading zeros, no trailing fractional zeros and no
/// trailing decimal point.
pub fn format_base_units(value: &BigUint, unit: Unit) -> String {
    let decimals = unit.decimals() as usize;
    if decimals == 0 {
        return value.to_string();
    }

    let multiplier = unit.wei_multiplier();
    let whole = value / &multiplier;
    let remainder = value % &multiplier;
    if remainder.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Convert a decimal amount in `unit` to a wei integer string.
pub fn to_base_units(amount: &str, unit: Unit) -> Result<String> {
    Ok(parse_base_units(amount, unit)?.to_string())
}

/// Convert a wei integer string to a canonical decimal string in `unit`.
pub fn to_display_units(base_amount: &str, unit: Unit) -> Result<String> {
    let wei = parse_base_units(base_amount, Unit::Wei)?;
    Ok(format_base_units(&wei, unit))
}

/// Convert an amount between two units, e.g. sparks to ether for a bid.
pub fn convert(amount: &str, from: Unit, to: Unit) -> Result<String> {
    let wei = parse_base_units(amount, from)?;
    Ok(format_base_units(&wei, to))
}
