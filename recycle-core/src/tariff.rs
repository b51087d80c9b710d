//! Registry of per-city tariffs.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::model::{Cities, CityId, CityMeta, FractionType, Fractions};
use crate::ports::TariffPort;

/// Unit prices for every fraction a single city accepts.
#[derive(Debug, Clone)]
pub struct CityTariff {
    /// Static metadata describing the city.
    pub meta: CityMeta,
    /// Price per kilogram, keyed by fraction.
    pub rates: HashMap<FractionType, Decimal>,
    /// Free kilograms per visit, keyed by fraction.
    pub exemptions: HashMap<FractionType, Decimal>,
}

impl CityTariff {
    /// Build a tariff from `(fraction, unit price)` pairs.
    #[must_use]
    pub fn new<I>(meta: CityMeta, rates: I) -> Self
    where
        I: IntoIterator<Item = (FractionType, Decimal)>,
    {
        Self {
            meta,
            rates: rates.into_iter().collect(),
            exemptions: HashMap::new(),
        }
    }

    /// Let `weight` kilograms of `fraction` through without charge.
    #[must_use]
    pub fn with_exemption(mut self, fraction: FractionType, weight: Decimal) -> Self {
        self.exemptions.insert(fraction, weight);
        self
    }
}

/// Registry that resolves tariffs by city identifier.
#[derive(Debug, Clone)]
pub struct TariffRegistry {
    tariffs: HashMap<CityId, CityTariff>,
}

impl TariffRegistry {
    /// Build a registry from the provided tariff list.
    #[must_use]
    pub fn new(tariffs: Vec<CityTariff>) -> Self {
        let tariffs_map = tariffs
            .into_iter()
            .map(|tariff| (tariff.meta.id.clone(), tariff))
            .collect();
        Self {
            tariffs: tariffs_map,
        }
    }

    /// Reference rates for Moon Village and Pineville.
    ///
    /// Pineville lets the first 100 kg of construction waste through for free.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            CityTariff::new(
                city_meta(Cities::MoonVillage),
                [
                    (Fractions::ConstructionWaste.into(), Decimal::new(15, 2)),
                    (Fractions::GreenWaste.into(), Decimal::new(9, 2)),
                ],
            ),
            CityTariff::new(
                city_meta(Cities::Pineville),
                [
                    (Fractions::ConstructionWaste.into(), Decimal::new(18, 2)),
                    (Fractions::GreenWaste.into(), Decimal::new(12, 2)),
                ],
            )
            .with_exemption(Fractions::ConstructionWaste.into(), Decimal::new(100, 0)),
        ])
    }

    /// Return metadata for all registered cities, sorted by id.
    #[must_use]
    pub fn cities(&self) -> Vec<CityMeta> {
        let mut cities: Vec<CityMeta> = self
            .tariffs
            .values()
            .map(|tariff| tariff.meta.clone())
            .collect();
        cities.sort_by(|left, right| left.id.cmp(&right.id));
        cities
    }
}

impl Default for TariffRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TariffPort for TariffRegistry {
    fn unit_price(&self, city: &CityId, fraction: &FractionType) -> Option<Decimal> {
        self.tariffs.get(city)?.rates.get(fraction).copied()
    }

    fn exempt_weight(&self, city: &CityId, fraction: &FractionType) -> Decimal {
        self.tariffs
            .get(city)
            .and_then(|tariff| tariff.exemptions.get(fraction))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

fn city_meta(city: Cities) -> CityMeta {
    let name = city.to_string();
    CityMeta {
        id: city.into(),
        name,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn builtin_rates() {
        let registry = TariffRegistry::builtin();

        let cases = [
            (Cities::MoonVillage, Fractions::ConstructionWaste, dec!(0.15)),
            (Cities::MoonVillage, Fractions::GreenWaste, dec!(0.09)),
            (Cities::Pineville, Fractions::ConstructionWaste, dec!(0.18)),
            (Cities::Pineville, Fractions::GreenWaste, dec!(0.12)),
        ];
        for (city, fraction, expected) in cases {
            let city = CityId::from(city);
            let fraction = FractionType::from(fraction);
            assert_eq!(
                registry.unit_price(&city, &fraction),
                Some(expected),
                "rate for {fraction} in {city}"
            );
        }
    }

    #[test]
    fn builtin_exemptions() {
        let registry = TariffRegistry::builtin();

        assert_eq!(
            registry.exempt_weight(&Cities::Pineville.into(), &Fractions::ConstructionWaste.into()),
            dec!(100),
            "Pineville construction waste"
        );
        assert_eq!(
            registry.exempt_weight(&Cities::Pineville.into(), &Fractions::GreenWaste.into()),
            dec!(0),
            "Pineville green waste"
        );
        assert_eq!(
            registry.exempt_weight(&Cities::MoonVillage.into(), &Fractions::ConstructionWaste.into()),
            dec!(0),
            "Moon Village has none"
        );
    }

    #[test]
    fn missing_rates_are_none() {
        let registry = TariffRegistry::builtin();

        assert_eq!(
            registry.unit_price(&CityId::from("Pineville"), &FractionType::from("Asbestos")),
            None,
            "unknown fraction"
        );
        assert_eq!(
            registry.unit_price(
                &CityId::from("Atlantis"),
                &Fractions::GreenWaste.into()
            ),
            None,
            "unknown city"
        );
    }

    #[test]
    fn lists_registered_cities() {
        let registry = TariffRegistry::builtin();

        let ids: Vec<CityId> = registry.cities().into_iter().map(|meta| meta.id).collect();
        assert_eq!(
            ids,
            [CityId::from(Cities::MoonVillage), CityId::from(Cities::Pineville)],
            "sorted city ids"
        );

        let names: Vec<String> = registry.cities().into_iter().map(|meta| meta.name).collect();
        assert_eq!(names, ["Moon Village", "Pineville"], "display names");
    }

    #[test]
    fn later_tariff_for_same_city_replaces_earlier() {
        let meta = city_meta(Cities::MoonVillage);
        let registry = TariffRegistry::new(vec![
            CityTariff::new(meta.clone(), [(Fractions::GreenWaste.into(), dec!(0.09))]),
            CityTariff::new(meta, [(Fractions::GreenWaste.into(), dec!(0.10))]),
        ]);

        assert_eq!(registry.cities().len(), 1, "one entry per city");
        assert_eq!(
            registry.unit_price(&Cities::MoonVillage.into(), &Fractions::GreenWaste.into()),
            Some(dec!(0.10)),
            "last tariff wins"
        );
    }
}
