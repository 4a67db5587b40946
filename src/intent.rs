//! Abstract description of a governance transaction.
//!
//! A `TransactionIntent` is what a proposal author describes in the UI: who
//! sends what to whom, with which calldata. The amount carries an explicit
//! unit so a value is never reinterpreted based on the transaction kind.

use crate::errors::{InputError, Result};
use crate::units::{self, Unit};
use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Kind of proposal transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    SendEth,
    SendTokens,
    SendNft,
    DroposalMint,
    Airdrop,
    Custom,
}

impl IntentKind {
    /// Unit assumed for `value` when the intent does not state one.
    ///
    /// Only native transfers are entered in ether; every other kind already
    /// carries a wei amount.
    pub const fn default_unit(self) -> Unit {
        match self {
            IntentKind::SendEth => Unit::Ether,
            _ => Unit::Wei,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            IntentKind::SendEth => "SEND ETH",
            IntentKind::SendTokens => "SEND TOKENS",
            IntentKind::SendNft => "SEND NFT",
            IntentKind::DroposalMint => "DROPOSAL MINT",
            IntentKind::Airdrop => "AIRDROP",
            IntentKind::Custom => "CUSTOM TRANSACTION",
        }
    }
}

/// A transaction to simulate or execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    pub kind: IntentKind,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    /// Hex-encoded calldata, `0x` for a plain transfer
    #[serde(default)]
    pub calldata: Option<String>,
    /// Non-negative decimal amount, denominated in `unit`
    #[serde(default = "zero_value")]
    pub value: String,
    #[serde(default)]
    pub unit: Option<Unit>,
    /// ABI of the target contract, forwarded to the simulator for decoding
    #[serde(default, alias = "contract_abi")]
    pub contract_abi: Option<serde_json::Value>,
}

fn zero_value() -> String {
    "0".to_string()
}

impl TransactionIntent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            from: None,
            to: None,
            calldata: None,
            value: zero_value(),
            unit: None,
            contract_abi: None,
        }
    }

    pub fn from_address(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn to_address(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn calldata(mut self, calldata: impl Into<String>) -> Self {
        self.calldata = Some(calldata.into());
        self
    }

    pub fn value(mut self, amount: impl Into<String>, unit: Unit) -> Self {
        self.value = amount.into();
        self.unit = Some(unit);
        self
    }

    pub fn contract_abi(mut self, abi: serde_json::Value) -> Self {
        self.contract_abi = Some(abi);
        self
    }

    /// Load an intent from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| InputError::InvalidIntentFile {
            path: path.display().to_string(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let intent = serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;
        Ok(intent)
    }

    /// The unit `value` is denominated in.
    pub fn unit(&self) -> Unit {
        self.unit.unwrap_or_else(|| self.kind.default_unit())
    }

    /// The intent's value converted to wei.
    pub fn value_in_wei(&self) -> Result<String> {
        units::to_base_units(&self.value, self.unit())
    }

    /// Validate every field and return the parsed addresses and calldata.
    ///
    /// # Errors
    ///
    /// - `MissingField` if `to`, `from` or `calldata` is absent or empty
    /// - `InvalidAddress` if `to` or `from` is not a well-formed address
    /// - `InvalidHexData` if `calldata` is not hex
    /// - `InvalidAmount` if `value` is not a non-negative decimal
    pub fn validate(&self) -> Result<ValidatedIntent> {
        let to = required(&self.to, "to")?;
        let from = required(&self.from, "from")?;
        let calldata = required(&self.calldata, "calldata")?;

        let to = crate::utils::string_to_h160(to)?;
        let from = crate::utils::string_to_h160(from)?;
        let input = Bytes::from_str(calldata).map_err(|e| InputError::InvalidHexData {
            field: "calldata",
            reason: e.to_string(),
        })?;
        let value_wei = self.value_in_wei()?;

        Ok(ValidatedIntent {
            from,
            to,
            input,
            value_wei,
        })
    }
}

/// Parsed, validated view of a `TransactionIntent`
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedIntent {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value_wei: String,
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(InputError::MissingField { field: name }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VerifierError;
    use std::io::Write;

    const TREASURY: &str = "0x3a8d8f6e1c2b4a5d6e7f8091a2b3c4d5e6f70819";
    const RECIPIENT: &str = "0x8e2e3d4d4d3a2b2c2d2e2f303132333435363738";

    fn send_eth() -> TransactionIntent {
        TransactionIntent::new(IntentKind::SendEth)
            .from_address(TREASURY)
            .to_address(RECIPIENT)
            .calldata("0x")
    }

    #[test]
    fn test_send_eth_defaults_to_ether() {
        let mut intent = send_eth();
        intent.value = "0.5".to_string();
        assert_eq!(intent.unit(), Unit::Ether);
        assert_eq!(intent.validate().unwrap().value_wei, "500000000000000000");
    }

    #[test]
    fn test_explicit_unit_wins_over_kind() {
        let intent = send_eth().value("1000", Unit::Wei);
        assert_eq!(intent.validate().unwrap().value_wei, "1000");

        let mint = TransactionIntent::new(IntentKind::DroposalMint)
            .from_address(TREASURY)
            .to_address(RECIPIENT)
            .calldata("0xa0712d68")
            .value("3", Unit::Spark);
        assert_eq!(mint.validate().unwrap().value_wei, "300000000000000");
    }

    #[test]
    fn test_missing_fields() {
        let cases = [
            (TransactionIntent::new(IntentKind::Custom), "to"),
            (TransactionIntent::new(IntentKind::Custom).to_address(RECIPIENT), "from"),
            (
                TransactionIntent::new(IntentKind::Custom)
                    .to_address(RECIPIENT)
                    .from_address(TREASURY)
                    .calldata("  "),
                "calldata",
            ),
        ];
        for (intent, expected) in cases {
            match intent.validate() {
                Err(VerifierError::Input(InputError::MissingField { field })) => {
                    assert_eq!(field, expected)
                }
                other => panic!("expected missing {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_invalid_to_address() {
        let intent = send_eth().to_address("0x1234");
        assert!(matches!(
            intent.validate(),
            Err(VerifierError::Input(InputError::InvalidAddress { .. }))
        ));
    }

    #[test]
    fn test_invalid_calldata_and_value() {
        assert!(matches!(
            send_eth().calldata("0xnothex").validate(),
            Err(VerifierError::Input(InputError::InvalidHexData { .. }))
        ));
        assert!(matches!(
            send_eth().value("-1", Unit::Ether).validate(),
            Err(VerifierError::Input(InputError::InvalidAmount { .. }))
        ));
    }

    #[test]
    fn test_deserialize_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "kind": "droposal-mint",
                "from": "{}",
                "to": "{}",
                "calldata": "0x",
                "value": "0.01",
                "unit": "ether",
                "contractAbi": [{{"type": "function", "name": "mint"}}]
            }}"#,
            TREASURY, RECIPIENT
        )
        .unwrap();

        let intent = TransactionIntent::from_json_file(file.path()).unwrap();
        assert_eq!(intent.kind, IntentKind::DroposalMint);
        assert_eq!(intent.unit(), Unit::Ether);
        assert!(intent.contract_abi.is_some());
        assert_eq!(intent.validate().unwrap().value_wei, "10000000000000000");
    }

    #[test]
    fn test_unreadable_intent_file() {
        let err = TransactionIntent::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, VerifierError::Input(InputError::InvalidIntentFile { .. })));
    }
}
