//! Builder patterns for the verifier's clients.
//!
//! Builders start from a `VerifierConfig` and let callers override single
//! settings or inject their own collaborators before anything is built.
//!
//! # Available Builders
//!
//! - **`SimulationClientBuilder`**: Creates simulation clients with per-call overrides
//! - **`ExecutionResolverBuilder`**: Wires an `ExecutionResolver` to explorer and node
//!   sources, or to any other `LogSource` / `ReceiptSource`
//!
//! # Error Handling
//!
//! All build methods return `Result<T>`. Configuration is validated when
//! `build` is called, never later on the first network request.

pub mod resolver;
pub mod simulator;

// Re-export builders for convenience
pub use resolver::ExecutionResolverBuilder;
pub use simulator::SimulationClientBuilder;
