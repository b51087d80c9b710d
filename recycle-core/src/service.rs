//! High-level service facade turning a command plus history into a price event.

use std::sync::Arc;

use crate::calculator::calculate_price;
use crate::model::{
    CalculatePrice, CityMeta, DomainEvent, EventEnvelope, PRICE_CURRENCY, PriceWasCalculated,
    RecycleRequest, decode_history,
};
use crate::ports::PriceError;
use crate::tariff::TariffRegistry;

/// Public entry point for pricing drop-off sessions.
#[derive(Debug, Clone)]
pub struct PriceService {
    tariffs: Arc<TariffRegistry>,
}

impl PriceService {
    /// Create a new service bound to the provided tariffs.
    #[must_use]
    pub fn new(tariffs: Arc<TariffRegistry>) -> Self {
        Self { tariffs }
    }

    /// List all cities with a tariff.
    #[must_use]
    pub fn cities(&self) -> Vec<CityMeta> {
        self.tariffs.cities()
    }

    /// Price the session described by the request's history.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::UnsupportedCommand`] for anything but `CalculatePrice`,
    /// [`PriceError::MalformedEvent`] for undecodable history, and the
    /// calculator's errors when the history cannot be priced.
    pub fn calculate(
        &self,
        request: &RecycleRequest,
    ) -> Result<EventEnvelope<PriceWasCalculated>, PriceError> {
        let command = &request.command;
        if command.command_type != CalculatePrice::COMMAND_TYPE {
            return Err(PriceError::UnsupportedCommand(command.command_type.clone()));
        }

        let history = decode_history(&request.history)?;
        let price_amount = calculate_price(&history, self.tariffs.as_ref())?;

        Ok(EventEnvelope::new(
            DomainEvent::PRICE_WAS_CALCULATED,
            PriceWasCalculated {
                card_id: command.payload.card_id.clone(),
                price_amount,
                price_currency: PRICE_CURRENCY.to_owned(),
            },
        ))
    }
}
