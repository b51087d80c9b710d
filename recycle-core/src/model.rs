//! Domain events, command envelopes, and identifiers for drop-off sessions.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::ports::PriceError;

/// Currency every calculated price is denominated in.
pub const PRICE_CURRENCY: &str = "EUR";

/// Built-in cities with a reference tariff.
pub enum Cities {
    /// Moon Village.
    MoonVillage,
    /// Pineville.
    Pineville,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a city with its own tariff.
pub struct CityId(pub String);

impl fmt::Display for Cities {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cities::MoonVillage => "Moon Village",
            Cities::Pineville => "Pineville",
        };
        write!(formatter, "{name}")
    }
}

impl From<Cities> for CityId {
    fn from(city: Cities) -> Self {
        CityId(city.to_string())
    }
}

impl From<&str> for CityId {
    fn from(city: &str) -> Self {
        CityId(city.to_owned())
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a city and its human-friendly name.
pub struct CityMeta {
    /// Unique identifier, as sent in `IdCardRegistered`.
    pub id: CityId,
    /// Display name.
    pub name: String,
}

/// Fraction types priced by the built-in tariffs.
pub enum Fractions {
    /// Rubble, bricks, and other construction debris.
    ConstructionWaste,
    /// Garden clippings and other organic yard waste.
    GreenWaste,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Waste category selected before a batch is unloaded.
pub struct FractionType(pub String);

impl fmt::Display for Fractions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Fractions::ConstructionWaste => "Construction waste",
            Fractions::GreenWaste => "Green waste",
        };
        write!(formatter, "{label}")
    }
}

impl From<Fractions> for FractionType {
    fn from(fraction: Fractions) -> Self {
        FractionType(fraction.to_string())
    }
}

impl From<&str> for FractionType {
    fn from(fraction: &str) -> Self {
        FractionType(fraction.to_owned())
    }
}

impl fmt::Display for FractionType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of the visitor's id card.
pub struct CardId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The visitor's id card was scanned at the entrance.
pub struct IdCardRegistered {
    /// City the visitor lives in; selects the tariff.
    pub city: CityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The vehicle was weighed.
pub struct WeightWasMeasured {
    /// Absolute scale reading in kilograms.
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The visitor declared which fraction the next batch belongs to.
pub struct FractionWasSelected {
    /// Fraction of the batch about to be unloaded.
    pub fraction_type: FractionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Outcome of a price calculation.
pub struct PriceWasCalculated {
    /// Card the price is charged to.
    pub card_id: CardId,
    /// Total owed for the visit.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_amount: Decimal,
    /// Currency code of `price_amount`.
    pub price_currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Closed set of events that can appear in a session history.
pub enum DomainEvent {
    /// See [`IdCardRegistered`].
    IdCardRegistered(IdCardRegistered),
    /// See [`WeightWasMeasured`].
    WeightWasMeasured(WeightWasMeasured),
    /// See [`FractionWasSelected`].
    FractionWasSelected(FractionWasSelected),
    /// See [`PriceWasCalculated`].
    PriceWasCalculated(PriceWasCalculated),
}

impl DomainEvent {
    /// Wire tag of `IdCardRegistered` events.
    pub const ID_CARD_REGISTERED: &'static str = "IdCardRegistered";
    /// Wire tag of `WeightWasMeasured` events.
    pub const WEIGHT_WAS_MEASURED: &'static str = "WeightWasMeasured";
    /// Wire tag of `FractionWasSelected` events.
    pub const FRACTION_WAS_SELECTED: &'static str = "FractionWasSelected";
    /// Wire tag of `PriceWasCalculated` events.
    pub const PRICE_WAS_CALCULATED: &'static str = "PriceWasCalculated";

    /// The `type` tag this event carries on the wire.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::IdCardRegistered(_) => Self::ID_CARD_REGISTERED,
            DomainEvent::WeightWasMeasured(_) => Self::WEIGHT_WAS_MEASURED,
            DomainEvent::FractionWasSelected(_) => Self::FRACTION_WAS_SELECTED,
            DomainEvent::PriceWasCalculated(_) => Self::PRICE_WAS_CALCULATED,
        }
    }

    /// Decode the envelope found at `position` in a history.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::MalformedEvent`] when the tag is unknown or the
    /// payload does not have the shape the tag requires.
    pub fn decode(position: usize, envelope: &EventEnvelope) -> Result<Self, PriceError> {
        match envelope.event_type.as_str() {
            Self::ID_CARD_REGISTERED => decode_payload(position, envelope).map(Self::IdCardRegistered),
            Self::WEIGHT_WAS_MEASURED => decode_payload(position, envelope).map(Self::WeightWasMeasured),
            Self::FRACTION_WAS_SELECTED => {
                decode_payload(position, envelope).map(Self::FractionWasSelected)
            }
            Self::PRICE_WAS_CALCULATED => {
                decode_payload(position, envelope).map(Self::PriceWasCalculated)
            }
            other => Err(PriceError::MalformedEvent {
                position,
                event_type: other.to_owned(),
                reason: String::from("unknown event type"),
            }),
        }
    }
}

fn decode_payload<T: DeserializeOwned>(
    position: usize,
    envelope: &EventEnvelope,
) -> Result<T, PriceError> {
    T::deserialize(&envelope.payload).map_err(|err| PriceError::MalformedEvent {
        position,
        event_type: envelope.event_type.clone(),
        reason: err.to_string(),
    })
}

/// Decode a whole history, stopping at the first malformed event.
///
/// # Errors
///
/// Returns [`PriceError::MalformedEvent`] for the first envelope that fails to decode.
pub fn decode_history(history: &[EventEnvelope]) -> Result<Vec<DomainEvent>, PriceError> {
    history
        .iter()
        .enumerate()
        .map(|(position, envelope)| DomainEvent::decode(position, envelope))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Event as it travels over the wire: a tag, identity, timestamp, and payload.
pub struct EventEnvelope<P = Value> {
    /// Event kind, selects the payload shape.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Unique event identifier.
    #[serde(default)]
    pub event_id: String,
    /// When the event happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Kind-specific payload.
    pub payload: P,
}

impl<P> EventEnvelope<P> {
    /// Wrap a payload in a freshly identified envelope stamped with the current time.
    #[must_use]
    pub fn new(event_type: &str, payload: P) -> Self {
        Self {
            event_type: event_type.to_owned(),
            event_id: Uuid::new_v4().to_string(),
            created_at: Some(Utc::now()),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Command as it travels over the wire.
pub struct CommandEnvelope<P = CalculatePrice> {
    /// Command kind.
    #[serde(rename = "type")]
    pub command_type: String,
    /// Unique command identifier.
    #[serde(default)]
    pub command_id: String,
    /// When the command was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Kind-specific payload.
    pub payload: P,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Ask for the price of the visit recorded in the accompanying history.
pub struct CalculatePrice {
    /// Card the price is charged to.
    pub card_id: CardId,
}

impl CalculatePrice {
    /// Wire tag of the command.
    pub const COMMAND_TYPE: &'static str = "CalculatePrice";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Request body: a command plus the full history of the session.
pub struct RecycleRequest {
    /// Command to execute.
    pub command: CommandEnvelope,
    /// Session events in chronological order.
    #[serde(default)]
    pub history: Vec<EventEnvelope>,
}
