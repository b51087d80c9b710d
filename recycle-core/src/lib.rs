//! Core types and pricing logic for the recycling drop-off price calculator.

/// Replay of session histories into priced weight ledgers.
pub mod calculator;
/// Domain events, commands, and identifiers.
pub mod model;
/// Error type and the tariff lookup trait.
pub mod ports;
/// High-level service facade used by transports.
pub mod service;
/// Registry of per-city tariffs.
pub mod tariff;

pub use calculator::*;
pub use model::*;
pub use ports::*;
pub use service::*;
pub use tariff::*;
