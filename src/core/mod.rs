pub mod alerts;
pub mod rules;
pub mod shipment;

// Flat public surface for domain types and tables.
pub use alerts::{Alert, AlertKind, Alerts};
pub use rules::{
    has_trade_agreement, validate_certification_rules, validate_special_tax_rules,
    CertificationRule, SpecialTaxCategory, SpecialTaxRule, CERTIFICATION_RULES, SPECIAL_TAX_RULES,
    TRADE_AGREEMENT_COUNTRIES,
};
pub use shipment::{ConfidenceLevel, InputError, ShipmentInput, TariffSuggestion};

/// Column description for CSV input, generated by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}
