use super::rules::KNOWN_COUNTRIES;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Upper bound accepted for any single USD amount
pub const MAX_AMOUNT_USD: Decimal = dec!(1000000000000);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("country of origin is required")]
    MissingCountry,
    #[error("unknown country of origin: {0}")]
    UnknownCountry(String),
    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("{field} exceeds the maximum of {max} USD (got {value})")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },
    #[error("exchange rate must be positive (got {0})")]
    InvalidExchangeRate(Decimal),
}

/// Shipment data as entered by the importer. All amounts in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShipmentInput {
    /// Free text description of the product
    #[serde(default)]
    pub description: String,
    /// Country of origin (e.g. "China", "México")
    pub country: String,
    /// FOB value of the goods
    #[schemars(with = "f64")]
    pub fob_usd: Decimal,
    /// International freight
    #[schemars(with = "f64")]
    pub freight_usd: Decimal,
    /// Declared insurance. Absent means the theoretical 2% is applied; zero is a valid declaration.
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub declared_insurance_usd: Option<Decimal>,
    /// Whether the goods are used
    #[serde(default)]
    pub is_used: bool,
}

impl ShipmentInput {
    /// Check the fields the calculation relies on before it is invoked.
    pub fn validate(&self) -> Result<(), InputError> {
        let country = self.country.trim();
        if country.is_empty() {
            return Err(InputError::MissingCountry);
        }
        if !KNOWN_COUNTRIES.contains(&country) {
            return Err(InputError::UnknownCountry(country.to_string()));
        }

        let amounts = [
            ("fob_usd", Some(self.fob_usd)),
            ("freight_usd", Some(self.freight_usd)),
            ("declared_insurance_usd", self.declared_insurance_usd),
        ];
        for (field, value) in amounts {
            match value {
                Some(value) if value < Decimal::ZERO => {
                    return Err(InputError::NegativeAmount { field, value })
                }
                Some(value) if value > MAX_AMOUNT_USD => {
                    return Err(InputError::AmountTooLarge {
                        field,
                        value,
                        max: MAX_AMOUNT_USD,
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Confidence reported by the classifier for a tariff suggestion
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, JsonSchema,
)]
pub enum ConfidenceLevel {
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Medio")]
    Medium,
    #[serde(rename = "Bajo")]
    #[default]
    Low,
}

impl ConfidenceLevel {
    /// Parse either the English names or the Spanish labels used by the classifier
    pub fn from_str(s: &str) -> Option<ConfidenceLevel> {
        match s.trim().to_lowercase().as_str() {
            "high" | "alto" => Some(ConfidenceLevel::High),
            "medium" | "medio" => Some(ConfidenceLevel::Medium),
            "low" | "bajo" => Some(ConfidenceLevel::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "Alto",
            ConfidenceLevel::Medium => "Medio",
            ConfidenceLevel::Low => "Bajo",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl<'de> Deserialize<'de> for ConfidenceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ConfidenceLevel::from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown confidence level: {s}")))
    }
}

/// A candidate HS tariff code returned by the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TariffSuggestion {
    /// HS code, dot separated (e.g. "8903.92")
    #[serde(alias = "codigo")]
    pub code: String,
    /// Official description of the code
    #[serde(default, alias = "descripcion")]
    pub description: String,
    /// Classifier confidence; defaults to Low when missing
    #[serde(default, alias = "nivel_confianza")]
    pub confidence: ConfidenceLevel,
}

impl TariffSuggestion {
    pub fn new(code: &str, description: &str, confidence: ConfidenceLevel) -> Self {
        TariffSuggestion {
            code: code.trim().to_string(),
            description: description.to_string(),
            confidence,
        }
    }

    /// The HS chapter: first two characters of the code
    pub fn chapter(&self) -> Option<&str> {
        self.code.get(..2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipment(country: &str) -> ShipmentInput {
        ShipmentInput {
            description: "zapatillas".to_string(),
            country: country.to_string(),
            fob_usd: dec!(100),
            freight_usd: dec!(20),
            declared_insurance_usd: None,
            is_used: false,
        }
    }

    #[test]
    fn valid_shipment() {
        assert_eq!(shipment("China").validate(), Ok(()));
        assert_eq!(shipment("Otro").validate(), Ok(()));
    }

    #[test]
    fn empty_country_rejected() {
        assert_eq!(shipment("  ").validate(), Err(InputError::MissingCountry));
    }

    #[test]
    fn unknown_country_rejected() {
        assert_eq!(
            shipment("Atlantis").validate(),
            Err(InputError::UnknownCountry("Atlantis".to_string()))
        );
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut s = shipment("China");
        s.declared_insurance_usd = Some(dec!(-1));
        assert_eq!(
            s.validate(),
            Err(InputError::NegativeAmount {
                field: "declared_insurance_usd",
                value: dec!(-1)
            })
        );
    }

    #[test]
    fn oversized_amounts_rejected() {
        let mut s = shipment("India");
        s.fob_usd = dec!(1e26);
        assert_eq!(
            s.validate(),
            Err(InputError::AmountTooLarge {
                field: "fob_usd",
                value: dec!(1e26),
                max: MAX_AMOUNT_USD
            })
        );

        s.fob_usd = MAX_AMOUNT_USD;
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn zero_insurance_is_valid() {
        let mut s = shipment("China");
        s.declared_insurance_usd = Some(dec!(0));
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn confidence_from_str() {
        assert_eq!(ConfidenceLevel::from_str("Alto"), Some(ConfidenceLevel::High));
        assert_eq!(ConfidenceLevel::from_str("medio"), Some(ConfidenceLevel::Medium));
        assert_eq!(ConfidenceLevel::from_str("LOW"), Some(ConfidenceLevel::Low));
        assert_eq!(ConfidenceLevel::from_str("certain"), None);
    }

    #[test]
    fn suggestion_deserializes_with_default_confidence() {
        let s: TariffSuggestion =
            serde_json::from_str(r#"{"code": "6402.99", "description": "Calzado"}"#).unwrap();
        assert_eq!(s.confidence, ConfidenceLevel::Low);
        assert_eq!(s.chapter(), Some("64"));
    }

    #[test]
    fn suggestion_accepts_classifier_field_names() {
        let s: TariffSuggestion = serde_json::from_str(
            r#"{"codigo": "8517.62", "descripcion": "Aparatos", "nivel_confianza": "Alto"}"#,
        )
        .unwrap();
        assert_eq!(s.code, "8517.62");
        assert_eq!(s.confidence, ConfidenceLevel::High);
    }
}
