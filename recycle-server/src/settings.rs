//! Layered configuration: a TOML file plus `RECYCLE__*` environment overrides.

use std::collections::HashSet;
use std::env;

use anyhow::{Result, bail};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use recycle_core::{CityId, CityMeta, CityTariff, FractionType, TariffRegistry};
use rust_decimal::Decimal;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/default";
const CONFIG_PATH_VAR: &str = "RECYCLE_CONFIG";
const ENV_PREFIX: &str = "RECYCLE";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Settings {
    pub(crate) server: ServerSettings,
    #[serde(default)]
    pub(crate) log: LogSettings,
    #[serde(default)]
    pub(crate) tariffs: Vec<TariffSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LogSettings {
    /// Fallback `EnvFilter` directives when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub(crate) filter: String,
    #[serde(default)]
    pub(crate) format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_filter() -> String {
    String::from("recycle_server=info,tower_http=info")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// One city's rates as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TariffSettings {
    pub(crate) city: String,
    /// Display name, defaults to the city id.
    #[serde(default)]
    pub(crate) name: Option<String>,
    pub(crate) rates: Vec<RateSettings>,
    #[serde(default)]
    pub(crate) exemptions: Vec<ExemptionSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RateSettings {
    pub(crate) fraction_type: String,
    /// Price per kilogram. Written as a string to keep it exact.
    pub(crate) unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ExemptionSettings {
    pub(crate) fraction_type: String,
    /// Free kilograms per visit.
    pub(crate) weight: Decimal,
}

impl Settings {
    /// Load from `$RECYCLE_CONFIG` (default `config/default`) and the environment.
    pub(crate) fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::build(Config::builder().add_source(File::with_name(&path)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let settings: Self = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.tariffs.is_empty() {
            bail!("At least one tariff must be configured");
        }

        let mut cities = HashSet::new();
        for tariff in &self.tariffs {
            if !cities.insert(tariff.city.as_str()) {
                bail!("Duplicate tariff for city '{}'", tariff.city);
            }
            validate_tariff(tariff)?;
        }

        Ok(())
    }

    /// Build the registry the price service looks rates up in.
    pub(crate) fn tariff_registry(&self) -> TariffRegistry {
        TariffRegistry::new(self.tariffs.iter().map(TariffSettings::to_tariff).collect())
    }
}

fn validate_tariff(tariff: &TariffSettings) -> Result<()> {
    let mut fractions = HashSet::new();
    for rate in &tariff.rates {
        if !fractions.insert(rate.fraction_type.as_str()) {
            bail!(
                "Duplicate rate for '{}' in city '{}'",
                rate.fraction_type,
                tariff.city
            );
        }
        if rate.unit_price.is_sign_negative() {
            bail!(
                "Negative unit price for '{}' in city '{}'",
                rate.fraction_type,
                tariff.city
            );
        }
    }

    for exemption in &tariff.exemptions {
        if exemption.weight.is_sign_negative() {
            bail!(
                "Negative exemption for '{}' in city '{}'",
                exemption.fraction_type,
                tariff.city
            );
        }
    }

    Ok(())
}

impl TariffSettings {
    fn to_tariff(&self) -> CityTariff {
        let meta = CityMeta {
            id: CityId(self.city.clone()),
            name: self.name.clone().unwrap_or_else(|| self.city.clone()),
        };
        let rates = self
            .rates
            .iter()
            .map(|rate| (FractionType(rate.fraction_type.clone()), rate.unit_price));

        self.exemptions
            .iter()
            .fold(CityTariff::new(meta, rates), |tariff, exemption| {
                tariff.with_exemption(
                    FractionType(exemption.fraction_type.clone()),
                    exemption.weight,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;
    use recycle_core::{Fractions, TariffPort};
    use rust_decimal_macros::dec;

    use super::*;

    fn from_toml(source: &str) -> Result<Settings> {
        Settings::build(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    const PINEVILLE: &str = r#"
        [server]
        port = 9090

        [log]
        format = "json"

        [[tariffs]]
        city = "Pineville"
        rates = [
            { fraction_type = "Construction waste", unit_price = "0.18" },
            { fraction_type = "Green waste", unit_price = "0.12" },
        ]
        exemptions = [
            { fraction_type = "Construction waste", weight = "100" },
        ]
    "#;

    #[test]
    fn loads_tariffs_and_defaults() {
        let settings = from_toml(PINEVILLE).expect("valid settings");

        assert_eq!(settings.server.host, DEFAULT_HOST, "default host");
        assert_eq!(settings.server.port, 9090, "configured port");
        assert_eq!(settings.log.format, LogFormat::Json, "log format");
        assert_eq!(settings.log.filter, default_log_filter(), "default filter");

        let registry = settings.tariff_registry();
        let pineville = CityId::from("Pineville");
        assert_eq!(
            registry.unit_price(&pineville, &FractionType::from("Green waste")),
            Some(dec!(0.12)),
            "green waste rate"
        );
        assert_eq!(
            registry.exempt_weight(&pineville, &FractionType::from("Construction waste")),
            dec!(100),
            "construction exemption"
        );
        let names: Vec<String> = registry.cities().into_iter().map(|meta| meta.name).collect();
        assert_eq!(names, ["Pineville"], "name falls back to the city id");
    }

    #[test]
    fn rejects_empty_tariff_list() {
        let err = from_toml("tariffs = []").expect_err("no tariffs");
        assert!(err.to_string().contains("At least one tariff"), "{err}");
    }

    #[test]
    fn rejects_duplicate_cities() {
        let source = r#"
            [[tariffs]]
            city = "Pineville"
            rates = [{ fraction_type = "Green waste", unit_price = "0.12" }]

            [[tariffs]]
            city = "Pineville"
            rates = [{ fraction_type = "Green waste", unit_price = "0.10" }]
        "#;
        let err = from_toml(source).expect_err("duplicate city");
        assert!(err.to_string().contains("Duplicate tariff"), "{err}");
    }

    #[test]
    fn rejects_duplicate_and_negative_rates() {
        let duplicate = r#"
            [[tariffs]]
            city = "Moon Village"
            rates = [
                { fraction_type = "Green waste", unit_price = "0.09" },
                { fraction_type = "Green waste", unit_price = "0.10" },
            ]
        "#;
        let err = from_toml(duplicate).expect_err("duplicate fraction");
        assert!(err.to_string().contains("Duplicate rate"), "{err}");

        let negative = r#"
            [[tariffs]]
            city = "Moon Village"
            rates = [{ fraction_type = "Green waste", unit_price = "-0.09" }]
        "#;
        let err = from_toml(negative).expect_err("negative price");
        assert!(err.to_string().contains("Negative unit price"), "{err}");
    }

    #[test]
    fn shipped_config_matches_builtin_tariffs() {
        let source = include_str!("../../config/default.toml");
        let registry = from_toml(source).expect("shipped config is valid").tariff_registry();
        let builtin = TariffRegistry::builtin();

        let ids = |registry: &TariffRegistry| -> Vec<CityId> {
            registry.cities().into_iter().map(|meta| meta.id).collect()
        };
        assert_eq!(ids(&registry), ids(&builtin), "same cities");

        let fractions = [Fractions::ConstructionWaste, Fractions::GreenWaste].map(FractionType::from);
        for city in builtin.cities() {
            for fraction in &fractions {
                assert_eq!(
                    registry.unit_price(&city.id, fraction),
                    builtin.unit_price(&city.id, fraction),
                    "{fraction} in {}",
                    city.id
                );
                assert_eq!(
                    registry.exempt_weight(&city.id, fraction),
                    builtin.exempt_weight(&city.id, fraction),
                    "exemption for {fraction} in {}",
                    city.id
                );
            }
        }
    }
}
