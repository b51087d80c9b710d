//! Replays a session history into delivered weight per fraction and prices it.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{CityId, DomainEvent, FractionType};
use crate::ports::{PriceError, TariffPort};

/// Decimal places prices are rounded to.
const PRICE_SCALE: u32 = 2;

/// Kilograms delivered per fraction during one visit, plus the visitor's city.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightLedger {
    city: Option<CityId>,
    weights: BTreeMap<FractionType, Decimal>,
}

impl WeightLedger {
    /// City of the first registered id card, if any.
    #[must_use]
    pub fn city(&self) -> Option<&CityId> {
        self.city.as_ref()
    }

    /// Accumulated kilograms per fraction. Entries may be zero or negative.
    #[must_use]
    pub fn weights(&self) -> &BTreeMap<FractionType, Decimal> {
        &self.weights
    }

    /// Price the ledger against a tariff, rounded to cents.
    ///
    /// Fractions whose accumulated weight is exactly zero are not looked up.
    /// Exempt kilograms are deducted from each fraction before pricing.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::MissingCity`] when there is weight to price but no
    /// city, [`PriceError::UnknownRate`] when the tariff lacks a delivered fraction,
    /// and [`PriceError::Overflow`] when a fraction's price does not fit a `Decimal`.
    pub fn price<T: TariffPort + ?Sized>(&self, tariffs: &T) -> Result<Decimal, PriceError> {
        let mut total = Decimal::ZERO;

        for (fraction, weight) in self.weights.iter().filter(|(_, weight)| !weight.is_zero()) {
            let city = self.city.as_ref().ok_or(PriceError::MissingCity)?;
            let unit_price =
                tariffs
                    .unit_price(city, fraction)
                    .ok_or_else(|| PriceError::UnknownRate {
                        city: city.clone(),
                        fraction_type: fraction.clone(),
                    })?;
            let exempt = tariffs.exempt_weight(city, fraction);
            total = chargeable_weight(*weight, exempt)
                .and_then(|chargeable| chargeable.checked_mul(unit_price))
                .and_then(|amount| total.checked_add(amount))
                .ok_or_else(|| PriceError::Overflow {
                    fraction_type: fraction.clone(),
                })?;
        }

        Ok(total.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }
}

/// Weight left to charge once the exemption is used up.
///
/// Only deliveries consume the exemption; a negative balance is charged as-is.
fn chargeable_weight(weight: Decimal, exempt: Decimal) -> Option<Decimal> {
    if weight.is_sign_positive() {
        weight
            .checked_sub(exempt)
            .map(|chargeable| chargeable.max(Decimal::ZERO))
    } else {
        Some(weight)
    }
}

/// Position of the walk between weight readings.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scale {
    AwaitingBaseline,
    Tracking(Decimal),
}

/// Walk the history in order and accumulate removed weight per fraction.
///
/// The first reading is the baseline. Every later reading credits the drop
/// since the previous reading to the most recently selected fraction; drops
/// measured before any selection are discarded.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] when a drop or a fraction's running total
/// does not fit a `Decimal`.
pub fn replay(history: &[DomainEvent]) -> Result<WeightLedger, PriceError> {
    let mut ledger = WeightLedger::default();
    let mut scale = Scale::AwaitingBaseline;
    let mut current_fraction: Option<&FractionType> = None;

    for event in history {
        match event {
            DomainEvent::IdCardRegistered(registered) => {
                if ledger.city.is_none() {
                    ledger.city = Some(registered.city.clone());
                }
            }
            DomainEvent::FractionWasSelected(selected) => {
                current_fraction = Some(&selected.fraction_type);
            }
            DomainEvent::WeightWasMeasured(measured) => {
                if let Scale::Tracking(previous) = scale
                    && let Some(fraction) = current_fraction
                {
                    let delivered = ledger
                        .weights
                        .entry(fraction.clone())
                        .or_insert(Decimal::ZERO);
                    let so_far = *delivered;
                    *delivered = previous
                        .checked_sub(measured.weight)
                        .and_then(|delta| so_far.checked_add(delta))
                        .ok_or_else(|| PriceError::Overflow {
                            fraction_type: fraction.clone(),
                        })?;
                }
                scale = Scale::Tracking(measured.weight);
            }
            DomainEvent::PriceWasCalculated(_) => {}
        }
    }

    Ok(ledger)
}

/// Compute the total price of a session.
///
/// # Errors
///
/// See [`replay`] and [`WeightLedger::price`].
pub fn calculate_price<T: TariffPort + ?Sized>(
    history: &[DomainEvent],
    tariffs: &T,
) -> Result<Decimal, PriceError> {
    replay(history)?.price(tariffs)
}
