pub mod batch;
pub mod estimate;
pub mod rules;
pub mod schema;

use crate::core::InputError;
use crate::providers::exchange_rate::MINDICADOR_DOLAR_URL;
use crate::providers::{ExchangeRateSource, FixedRate, Mindicador};
use clap::Args;
use rust_decimal::Decimal;

/// Exchange rate options shared by the calculating commands
#[derive(Args, Debug)]
pub struct ExchangeRateArgs {
    /// CLP per USD. When omitted the Central Bank "dólar observado" is fetched.
    #[arg(long, env = "ARANCEL_EXCHANGE_RATE")]
    exchange_rate: Option<Decimal>,

    /// Endpoint serving the "dólar observado" series
    #[arg(long, env = "ARANCEL_EXCHANGE_RATE_URL", default_value = MINDICADOR_DOLAR_URL)]
    exchange_rate_url: String,
}

impl ExchangeRateArgs {
    fn source(&self) -> Box<dyn ExchangeRateSource> {
        match self.exchange_rate {
            Some(rate) => Box::new(FixedRate(rate)),
            None => Box::new(Mindicador::with_url(self.exchange_rate_url.clone())),
        }
    }

    /// Resolve the rate, translating provider failures into the user facing message
    pub fn resolve(&self) -> anyhow::Result<Decimal> {
        if let Some(rate) = self.exchange_rate.filter(|rate| *rate <= Decimal::ZERO) {
            return Err(InputError::InvalidExchangeRate(rate).into());
        }
        self.source().current_rate().map_err(|err| {
            log::error!("{}", err);
            anyhow::anyhow!(err.user_message())
        })
    }
}
