//! Utility functions for addresses, hashes, chains and numeric conversions.
//!
//! Address and hash parsing is strict here on purpose: the same helpers back
//! both intent validation and the resolver, so a value accepted by one is
//! accepted by the other.

use alloy::primitives::{Address, B256, U256};
use num_bigint::BigUint;
use std::str::FromStr;
use crate::errors::{ConfigError, InputError, Result};

/// Whether `s` is exactly 40 hex characters after an optional `0x` prefix.
pub fn is_valid_address(s: &str) -> bool {
    let hex_part = s.strip_prefix("0x").unwrap_or(s);
    hex_part.len() == 40 && hex_part.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse a string representation of an Ethereum address.
///
/// Accepts addresses with or without the "0x" prefix. Checksums are not
/// enforced; any casing of the 40 hex characters is accepted.
///
/// # Errors
///
/// Returns `InputError::InvalidAddress` if the string is not exactly 40 hex
/// characters after removing the prefix.
pub fn string_to_h160(s: &str) -> Result<Address> {
    if !is_valid_address(s) {
        return Err(InputError::InvalidAddress { input: s.to_string() }.into());
    }
    Address::from_str(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|_| InputError::InvalidAddress { input: s.to_string() }.into())
}

/// Normalize a transaction or topic hash into its canonical 32-byte form.
///
/// A missing `0x` prefix is tolerated and added before parsing, matching
/// what explorer APIs sometimes return.
pub fn normalize_hash(s: &str) -> Result<B256> {
    let trimmed = s.trim();
    let prefixed = if trimmed.starts_with("0x") {
        trimmed.to_string()
    } else {
        format!("0x{}", trimmed)
    };

    if prefixed.len() != 66 {
        return Err(InputError::InvalidHash { input: s.to_string() }.into());
    }
    B256::from_str(&prefixed).map_err(|_| InputError::InvalidHash { input: s.to_string() }.into())
}

/// Parse an integer that may be encoded either as `0x`-hex or as decimal.
///
/// Explorer APIs return block numbers and log indices as hex strings, while
/// user input is usually decimal.
pub fn parse_quantity(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some("") => Some(0),
        Some(hex_part) => u64::from_str_radix(hex_part, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Convert a U256 value to a BigUint.
pub fn u256_to_biguint(val: U256) -> BigUint {
    BigUint::from_bytes_be(&val.to_be_bytes::<32>())
}

/// Convert a BigUint to a U256 value.
///
/// # Errors
///
/// Returns an error if the value is larger than 2^256 - 1.
pub fn biguint_to_u256(val: &BigUint) -> Result<U256> {
    let bytes = val.to_bytes_be();
    if bytes.len() > 32 {
        return Err(InputError::InvalidAmount {
            input: val.to_string(),
            reason: "value does not fit in 256 bits".to_string(),
        }
        .into());
    }
    let mut u256_bytes = [0u8; 32];
    u256_bytes[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(U256::from_be_bytes(u256_bytes))
}

/// Get the chain ID for a given blockchain name.
///
/// The chain ID doubles as the simulation provider's `network_id`.
pub fn chain_id(chain: &str) -> Result<u64> {
    match chain {
        "ethereum" => Ok(1),
        "base" => Ok(8453),
        "base-sepolia" => Ok(84532),
        "zora" => Ok(7777777),
        _ => Err(ConfigError::InvalidValue {
            name: "chain".to_string(),
            reason: format!("unsupported chain: {}", chain),
        }
        .into()),
    }
}

/// Mask everything after the host of a URL so it can be logged.
///
/// RPC and explorer URLs frequently embed API keys in the path or query.
pub fn mask_url(url: &str) -> String {
    if let Ok(parsed_url) = url::Url::parse(url) {
        let host = parsed_url.host_str().unwrap_or("unknown");
        let scheme = parsed_url.scheme();
        format!("{}://{}/**masked**", scheme, host)
    } else {
        "**masked**".to_string()
    }
}
