use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DISCLAIMER: &str =
    "Este es un cálculo estimado y no reemplaza una liquidación aduanera formal.";

/// Kind of notice emitted during a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AlertKind {
    /// Estimate disclaimer, always first.
    #[serde(rename = "Aviso General")]
    Disclaimer,
    /// A regulator certification may be required.
    #[serde(rename = "Mercancía Regulada")]
    RegulatedGoods,
    /// Missing certifications may lead to fines or rejection.
    #[serde(rename = "Riesgo Aduanero")]
    CustomsRisk,
    /// Insurance was not declared and the theoretical rate was used.
    #[serde(rename = "Cálculo de Seguro")]
    InsuranceEstimate,
    #[serde(rename = "TLC Aplicado")]
    TradeAgreement,
    #[serde(rename = "Producto Usado")]
    UsedGoods,
    #[serde(rename = "Impuesto Especial")]
    SpecialTax,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Disclaimer => "Aviso General",
            AlertKind::RegulatedGoods => "Mercancía Regulada",
            AlertKind::CustomsRisk => "Riesgo Aduanero",
            AlertKind::InsuranceEstimate => "Cálculo de Seguro",
            AlertKind::TradeAgreement => "TLC Aplicado",
            AlertKind::UsedGoods => "Producto Usado",
            AlertKind::SpecialTax => "Impuesto Especial",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

/// Append-only list of alerts in emission order. Starts with the disclaimer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alerts(Vec<Alert>);

impl Alerts {
    pub fn new() -> Self {
        Alerts(vec![Alert {
            kind: AlertKind::Disclaimer,
            message: DISCLAIMER.to_string(),
        }])
    }

    pub fn push(&mut self, kind: AlertKind, message: impl Into<String>) {
        let message = message.into();
        log::debug!("Alert [{}]: {}", kind, message);
        self.0.push(Alert { kind, message });
    }

    pub fn into_vec(self) -> Vec<Alert> {
        self.0
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Alerts::new()
    }
}
