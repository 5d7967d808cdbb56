use crate::core::{SpecialTaxCategory, SpecialTaxRule, TariffSuggestion, SPECIAL_TAX_RULES};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Special tax rate as displayed: a percentage, or a label for variable rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SpecialTaxRate {
    Percent(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Label(&'static str),
}

impl SpecialTaxRate {
    pub fn none() -> Self {
        SpecialTaxRate::Percent(Decimal::ZERO)
    }
}

impl std::fmt::Display for SpecialTaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecialTaxRate::Percent(pct) => write!(f, "{}%", pct.normalize()),
            SpecialTaxRate::Label(label) => write!(f, "{}", label),
        }
    }
}

/// The special tax rule selected for a shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedSpecialTax {
    pub sub_category: &'static str,
    pub category: SpecialTaxCategory,
    pub matched_prefix: &'static str,
    pub rate: Decimal,
    pub display_rate: SpecialTaxRate,
    #[serde(skip)]
    pub warning: Option<&'static str>,
}

impl AppliedSpecialTax {
    fn from_rule(rule: &SpecialTaxRule, matched_prefix: &'static str) -> Self {
        let display_rate = if rule.rate > Decimal::ZERO {
            SpecialTaxRate::Percent(rule.rate * dec!(100))
        } else {
            SpecialTaxRate::Label(rule.rate_label)
        };
        AppliedSpecialTax {
            sub_category: rule.sub_category,
            category: rule.category,
            matched_prefix,
            rate: rule.rate,
            display_rate,
            warning: rule.warning,
        }
    }
}

/// First rule in table order with a prefix that `code` starts with
pub fn find_rule<'a>(rules: &'a [SpecialTaxRule], code: &str) -> Option<(&'a SpecialTaxRule, &'static str)> {
    rules
        .iter()
        .find_map(|rule| rule.matching_prefix(code).map(|prefix| (rule, prefix)))
}

/// Resolve the special tax from the most confident suggestion only
pub fn resolve_special_tax(suggestions: &[TariffSuggestion]) -> Option<AppliedSpecialTax> {
    let top = suggestions.first()?;
    let (rule, prefix) = find_rule(SPECIAL_TAX_RULES, &top.code)?;
    log::debug!(
        "Special tax rule '{}' matched {} via prefix {}",
        rule.sub_category,
        top.code,
        prefix
    );
    Some(AppliedSpecialTax::from_rule(rule, prefix))
}
