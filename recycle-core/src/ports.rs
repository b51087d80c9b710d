//! Error type and the tariff lookup trait the calculator prices against.

use rust_decimal::Decimal;

use crate::model::{CityId, FractionType};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors that can occur while pricing a session.
pub enum PriceError {
    /// Weight needs pricing but nobody registered an id card.
    #[error("No IdCardRegistered event in history; cannot resolve city")]
    MissingCity,
    /// The tariff has no rate for a fraction that was delivered.
    #[error("No rate for fraction `{fraction_type}` in city `{city}`")]
    UnknownRate {
        /// City the tariff was looked up for.
        city: CityId,
        /// Fraction without a rate.
        fraction_type: FractionType,
    },
    /// An event's payload does not match its type tag.
    #[error("Malformed {event_type} event at position {position}: {reason}")]
    MalformedEvent {
        /// Index of the event in the history.
        position: usize,
        /// Tag the event carried.
        event_type: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The command is not one the service handles.
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),
    /// A weight or price left the range `Decimal` can represent.
    #[error("Arithmetic overflow while pricing fraction `{fraction_type}`")]
    Overflow {
        /// Fraction whose weight or price overflowed.
        fraction_type: FractionType,
    },
}

/// Source of per-kilogram unit prices.
pub trait TariffPort: Send + Sync {
    /// Unit price for `fraction` in `city`, or `None` when no rate exists.
    fn unit_price(&self, city: &CityId, fraction: &FractionType) -> Option<Decimal>;

    /// Kilograms of `fraction` a visitor from `city` may deliver free of charge.
    fn exempt_weight(&self, _city: &CityId, _fraction: &FractionType) -> Decimal {
        Decimal::ZERO
    }
}
