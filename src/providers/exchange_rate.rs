use super::{ProviderError, Service};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Source of the current CLP per USD rate
pub trait ExchangeRateSource {
    fn current_rate(&self) -> Result<Decimal, ProviderError>;
}

/// A rate supplied up front (CLI flag or environment)
#[derive(Debug, Clone, Copy)]
pub struct FixedRate(pub Decimal);

impl ExchangeRateSource for FixedRate {
    fn current_rate(&self) -> Result<Decimal, ProviderError> {
        validate_rate(self.0)
    }
}

pub const MINDICADOR_DOLAR_URL: &str = "https://mindicador.cl/api/dolar";

/// Central Bank "dólar observado" via the public mindicador.cl API
#[derive(Debug, Clone)]
pub struct Mindicador {
    url: String,
    timeout: Duration,
}

impl Default for Mindicador {
    fn default() -> Self {
        Mindicador {
            url: MINDICADOR_DOLAR_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Mindicador {
    pub fn with_url(url: impl Into<String>) -> Self {
        Mindicador {
            url: url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MindicadorResponse {
    #[serde(default)]
    serie: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    fecha: DateTime<Utc>,
    valor: Decimal,
}

impl ExchangeRateSource for Mindicador {
    fn current_rate(&self) -> Result<Decimal, ProviderError> {
        let response = ureq::get(&self.url)
            .timeout(self.timeout)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => ProviderError::Status {
                    service: Service::ExchangeRate,
                    status,
                },
                ureq::Error::Transport(transport) => ProviderError::Unreachable {
                    service: Service::ExchangeRate,
                    reason: transport.to_string(),
                },
            })?;

        let body: MindicadorResponse =
            response
                .into_json()
                .map_err(|err| ProviderError::Malformed {
                    service: Service::ExchangeRate,
                    reason: err.to_string(),
                })?;
        latest_rate(body)
    }
}

fn latest_rate(body: MindicadorResponse) -> Result<Decimal, ProviderError> {
    let latest = body
        .serie
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed {
            service: Service::ExchangeRate,
            reason: "empty series".to_string(),
        })?;
    log::info!(
        "Dólar observado {} CLP ({})",
        latest.valor,
        latest.fecha.format("%Y-%m-%d")
    );
    validate_rate(latest.valor)
}

fn validate_rate(rate: Decimal) -> Result<Decimal, ProviderError> {
    if rate > Decimal::ZERO {
        Ok(rate)
    } else {
        Err(ProviderError::Malformed {
            service: Service::ExchangeRate,
            reason: format!("non-positive rate {}", rate),
        })
    }
}
