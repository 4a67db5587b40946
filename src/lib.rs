//! Proposal Verifier Library
//!
//! Pre-vote simulation and post-execution verification of DAO governance
//! proposals. Before a vote, a proposal's transaction is simulated against a
//! remote simulation provider. After execution, the transaction that
//! executed the proposal is located through an explorer log API, its receipt
//! is read from a node, and the contract it created is priced for minting.
//!
//! # Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - **`units`**: Exact conversion between ether, spark and wei amounts
//! - **`intent`**: Abstract transaction descriptors and their validation
//! - **`simulation`**: Simulation payload construction and provider client
//! - **`resolver`**: Execution transaction lookup, receipts and created contracts
//! - **`pricing`**: Live and static sale price reconciliation with protocol fees
//! - **`config`**: Environment-driven configuration and validation
//! - **`builders`**: Builder patterns for the verifier's clients
//! - **`errors`**: Error hierarchy shared by all modules
//! - **`utils`**: Address, hash and chain helpers
//!
//! # Core Concepts
//!
//! - **Transaction Intent**: What a proposal wants to do (send ETH, mint a
//!   drop, call a contract), independent of any provider's payload format
//! - **Simulation**: One billed request per call; failures are reported,
//!   never retried
//! - **Resolution**: One log query, then one receipt fetch if and only if a
//!   log matched. Callers decide whether and how often to re-invoke
//! - **Quote**: Mint and fee totals in wei, with validation signals instead
//!   of errors for bad quantities
//!
//! # Thread Safety
//!
//! Clients hold only immutable configuration and HTTP connection pools and
//! can be shared across tasks behind an `Arc`.

pub mod builders;
pub mod config;
pub mod errors;
pub mod intent;
pub mod pricing;
pub mod resolver;
pub mod simulation;
pub mod units;
pub mod utils;

// Re-export the main Result type and error enum for convenience
pub use errors::{Result, VerifierError};

// Re-export builder patterns for convenience
pub use builders::{ExecutionResolverBuilder, SimulationClientBuilder};

pub use config::VerifierConfig;
pub use intent::{IntentKind, TransactionIntent};
pub use pricing::{PriceReconciler, Quote, QuoteSignal};
pub use resolver::{ExecutionResolver, MatchQuery, ResolvedExecution};
pub use simulation::{SimulationClient, SimulationOutcome};
pub use units::Unit;
