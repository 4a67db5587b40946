//! Mint price and protocol fee reconciliation for drop proposals.
//!
//! A drop's price can come from two places: the live `salesConfig()` of the
//! deployed contract, and the static sale configuration stored in the
//! proposal metadata. Live data wins whenever it carries a real price.
//!
//! All arithmetic is done in wei on `U256`; ether strings are produced only
//! for display.

use crate::config::{PricingSettings, VerifierConfig};
use crate::errors::Result;
use crate::units::{self, Unit};
use crate::utils::{biguint_to_u256, u256_to_biguint};
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

/// Sale configuration of a drop contract, prices in wei
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SaleConfig {
    pub price_per_unit: U256,
    /// Maximum mints per address; 0 means unlimited
    pub max_per_address: u32,
    pub public_sale_start: u64,
    pub public_sale_end: u64,
    pub presale_start: u64,
    pub presale_end: u64,
    pub presale_merkle_root: B256,
}

/// Where a drop's sale currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SalePhase {
    NotStarted,
    Presale,
    PublicSale,
    Ended,
}

impl SaleConfig {
    /// Sale phase at `now`. Windows are `[start, end)` in unix seconds.
    pub fn phase(&self, now: DateTime<Utc>) -> SalePhase {
        let ts = u64::try_from(now.timestamp()).unwrap_or(0);
        let in_window = |start: u64, end: u64| start <= ts && ts < end;

        if in_window(self.public_sale_start, self.public_sale_end) {
            SalePhase::PublicSale
        } else if in_window(self.presale_start, self.presale_end) {
            SalePhase::Presale
        } else if ts >= self.public_sale_end && ts >= self.presale_end {
            SalePhase::Ended
        } else {
            SalePhase::NotStarted
        }
    }

    /// Flags a quantity above the per-address limit.
    pub fn check_quantity(&self, quantity: u64) -> Option<QuoteSignal> {
        exceeds_limit(self.max_per_address, quantity)
    }
}

fn exceeds_limit(max: u32, quantity: u64) -> Option<QuoteSignal> {
    (max != 0 && quantity > u64::from(max)).then_some(QuoteSignal::ExceedsMaxPerAddress { max })
}

/// Static sale price from proposal metadata.
///
/// A JSON number is an ether amount; a JSON string is a wei amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaticPrice {
    Ether(Number),
    Wei(String),
}

impl StaticPrice {
    pub fn to_wei(&self) -> Result<U256> {
        let wei = match self {
            StaticPrice::Ether(number) => {
                units::parse_base_units(&expand_exponent(&number.to_string()), Unit::Ether)?
            }
            StaticPrice::Wei(amount) => units::parse_base_units(amount, Unit::Wei)?,
        };
        biguint_to_u256(&wei)
    }
}

/// Rewrite `1.5e-5` style notation as a plain decimal.
fn expand_exponent(repr: &str) -> String {
    if repr.starts_with('-') {
        return repr.to_string();
    }
    let Some((mantissa, exponent)) = repr.split_once(['e', 'E']) else {
        return repr.to_string();
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return repr.to_string();
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{}{}", int_part, frac_part);
    let point = int_part.len() as i64 + exponent;

    if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{}{}", digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{}.{}", whole, fraction)
    }
}

/// Sale configuration as stored in proposal metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticSaleConfig {
    pub public_sale_price: Option<StaticPrice>,
    pub max_sale_purchase_per_address: u32,
    pub public_sale_start: u64,
    pub public_sale_end: u64,
    pub presale_start: u64,
    pub presale_end: u64,
    pub presale_merkle_root: Option<String>,
}

impl StaticSaleConfig {
    /// Price per unit in wei, `None` when the metadata carries no price.
    pub fn price_wei(&self) -> Result<Option<U256>> {
        self.public_sale_price.as_ref().map(StaticPrice::to_wei).transpose()
    }
}

/// Which configuration supplied the unit price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    Live,
    Static,
    None,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriceSource::Live => "live",
            PriceSource::Static => "static",
            PriceSource::None => "none",
        })
    }
}

/// Validation signals attached to a quote; never raised as errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "signal")]
pub enum QuoteSignal {
    InvalidQuantity,
    ExceedsMaxPerAddress { max: u32 },
    InvalidStaticPrice,
    LiveConfigUnavailable,
}

/// Total cost of minting `quantity` units
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub price_source: PriceSource,
    pub quantity: u64,
    pub price_per_unit_wei: U256,
    pub fee_per_unit_wei: U256,
    pub mint_total_wei: U256,
    pub fee_total_wei: U256,
    pub total_wei: U256,
    pub signals: Vec<QuoteSignal>,
    /// Sale phase of the live configuration, when one was read
    pub sale_phase: Option<SalePhase>,
}

impl Quote {
    pub fn is_valid(&self) -> bool {
        !self.signals.iter().any(|signal| {
            matches!(
                signal,
                QuoteSignal::InvalidQuantity | QuoteSignal::ExceedsMaxPerAddress { .. }
            )
        })
    }

    pub fn has_signal(&self, signal: &QuoteSignal) -> bool {
        self.signals.contains(signal)
    }

    pub fn price_per_unit_ether(&self) -> String {
        to_ether(self.price_per_unit_wei)
    }

    pub fn mint_total_ether(&self) -> String {
        to_ether(self.mint_total_wei)
    }

    pub fn fee_total_ether(&self) -> String {
        to_ether(self.fee_total_wei)
    }

    pub fn total_ether(&self) -> String {
        to_ether(self.total_wei)
    }
}

fn to_ether(wei: U256) -> String {
    units::format_base_units(&u256_to_biguint(wei), Unit::Ether)
}

/// Reads the live sale configuration of a drop contract
#[async_trait]
pub trait SaleConfigSource: Send + Sync {
    /// `Ok(None)` when the contract has no sale configuration to report.
    async fn sale_config(&self, contract: Address) -> Result<Option<SaleConfig>>;
}

/// Combines live and static sale data with the protocol fee
#[derive(Debug, Clone)]
pub struct PriceReconciler {
    fee_per_unit_wei: U256,
    empty_price_sentinel_wei: U256,
}

impl Default for PriceReconciler {
    fn default() -> Self {
        Self::new(&PricingSettings::default())
    }
}

impl PriceReconciler {
    pub fn new(settings: &PricingSettings) -> Self {
        Self {
            fee_per_unit_wei: settings.fee_per_unit_wei,
            empty_price_sentinel_wei: settings.empty_price_sentinel_wei,
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Self {
        Self::new(&config.pricing)
    }

    pub fn fee_per_unit_wei(&self) -> U256 {
        self.fee_per_unit_wei
    }

    /// Compute the cost of `quantity` units.
    ///
    /// Never fails: a non-positive quantity yields zero totals and an
    /// `InvalidQuantity` signal, and an unparseable static price is treated
    /// as absent with an `InvalidStaticPrice` signal.
    pub fn compute_total(
        &self,
        live: Option<&SaleConfig>,
        static_config: Option<&StaticSaleConfig>,
        quantity: i64,
    ) -> Quote {
        let mut signals = Vec::new();

        let (price_source, price_per_unit_wei) = match live {
            Some(config) if config.price_per_unit > self.empty_price_sentinel_wei => {
                (PriceSource::Live, config.price_per_unit)
            }
            _ => match static_config.map(StaticSaleConfig::price_wei) {
                Some(Ok(Some(price))) => (PriceSource::Static, price),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Ignoring unparseable static sale price");
                    signals.push(QuoteSignal::InvalidStaticPrice);
                    (PriceSource::None, U256::ZERO)
                }
                Some(Ok(None)) | None => (PriceSource::None, U256::ZERO),
            },
        };

        let quantity = match u64::try_from(quantity) {
            Ok(q) if q > 0 => q,
            _ => {
                signals.push(QuoteSignal::InvalidQuantity);
                0
            }
        };

        let limit_signal = match (live, static_config) {
            (Some(config), _) => config.check_quantity(quantity),
            (None, Some(config)) => exceeds_limit(config.max_sale_purchase_per_address, quantity),
            (None, None) => None,
        };
        signals.extend(limit_signal);

        let count = U256::from(quantity);
        let mint_total_wei = price_per_unit_wei.saturating_mul(count);
        let fee_total_wei = self.fee_per_unit_wei.saturating_mul(count);
        let total_wei = mint_total_wei.saturating_add(fee_total_wei);

        tracing::debug!(
            price_source = %price_source,
            price_per_unit_wei = %price_per_unit_wei,
            quantity,
            total_wei = %total_wei,
            signals = ?signals,
            "Quote computed"
        );

        Quote {
            price_source,
            quantity,
            price_per_unit_wei,
            fee_per_unit_wei: self.fee_per_unit_wei,
            mint_total_wei,
            fee_total_wei,
            total_wei,
            signals,
            sale_phase: None,
        }
    }

    /// Read the live configuration of `contract` (if given) and quote.
    ///
    /// A failed read falls back to static data and adds a
    /// `LiveConfigUnavailable` signal. When a live configuration was read,
    /// the quote also carries its current sale phase.
    pub async fn quote_for_contract(
        &self,
        source: &dyn SaleConfigSource,
        contract: Option<Address>,
        static_config: Option<&StaticSaleConfig>,
        quantity: i64,
    ) -> Quote {
        let mut unavailable = false;
        let live = match contract {
            Some(contract) => match source.sale_config(contract).await {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(
                        contract = %contract,
                        error = %e,
                        "Live sale configuration unavailable, using static data"
                    );
                    unavailable = true;
                    None
                }
            },
            None => None,
        };

        let mut quote = self.compute_total(live.as_ref(), static_config, quantity);
        quote.sale_phase = live.as_ref().map(|config| config.phase(Utc::now()));
        if unavailable {
            quote.signals.push(QuoteSignal::LiveConfigUnavailable);
        }
        quote
    }
}
