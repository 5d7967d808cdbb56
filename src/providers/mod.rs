//! Adapters for the services the calculation depends on.
//!
//! The calculation itself only consumes plain values; these traits are resolved
//! by the commands before it runs.

pub mod classifier;
pub mod exchange_rate;

pub use classifier::{Classifier, JsonFileClassifier, StaticClassifier};
pub use exchange_rate::{ExchangeRateSource, FixedRate, Mindicador};

/// External service an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Classifier,
    ExchangeRate,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Classifier => write!(f, "classifier"),
            Service::ExchangeRate => write!(f, "exchange rate service"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{service} unreachable: {reason}")]
    Unreachable { service: Service, reason: String },
    #[error("{service} returned HTTP {status}")]
    Status { service: Service, status: u16 },
    #[error("{service} returned malformed data: {reason}")]
    Malformed { service: Service, reason: String },
    #[error("failed to read {service} input: {source}")]
    Io {
        service: Service,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    pub fn service(&self) -> Service {
        match self {
            ProviderError::Unreachable { service, .. }
            | ProviderError::Status { service, .. }
            | ProviderError::Malformed { service, .. }
            | ProviderError::Io { service, .. } => *service,
        }
    }

    /// Message suitable for showing to the importer
    pub fn user_message(&self) -> &'static str {
        match self.service() {
            Service::Classifier => "No se pudo clasificar el producto desde el servicio de IA.",
            Service::ExchangeRate => {
                "No se pudo obtener el tipo de cambio del Banco Central de Chile. Inténtalo de nuevo."
            }
        }
    }
}
