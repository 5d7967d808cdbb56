//! Import duty and tax calculation.
//!
//! Stages run in a fixed order and each one may append alerts:
//! documents, insurance, CIF, ad valorem duty (+ used goods surcharge),
//! special tax, IVA, totals and CLP conversion. No rounding is applied here.

use super::agent::{recommend_agent, AgentRecommendation};
use super::chile::{
    format_percentage, GENERAL_DUTY_RATE, THEORETICAL_INSURANCE_RATE, USED_GOODS_SURCHARGE,
    VAT_RATE,
};
use super::documents::{resolve_documents, AdditionalDocument};
use super::special::{resolve_special_tax, AppliedSpecialTax, SpecialTaxRate};
use crate::core::{has_trade_agreement, Alert, AlertKind, Alerts, ShipmentInput, TariffSuggestion};
use rust_decimal::Decimal;
use serde::Serialize;

/// How the insurance amount was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsuranceMethod {
    #[serde(rename = "declarado")]
    Declared,
    #[serde(rename = "teórico 2%")]
    Theoretical,
}

impl InsuranceMethod {
    pub fn label(&self) -> &'static str {
        match self {
            InsuranceMethod::Declared => "declarado",
            InsuranceMethod::Theoretical => "teórico 2%",
        }
    }
}

impl std::fmt::Display for InsuranceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Full duty and tax breakdown for one shipment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub trade_agreement: String,
    pub duty_rate_display: String,
    pub insurance_method: InsuranceMethod,
    pub insurance_usd: Decimal,
    pub cif_usd: Decimal,
    pub duty_rate: Decimal,
    pub base_duty_usd: Decimal,
    pub used_surcharge_usd: Decimal,
    pub customs_duty_usd: Decimal,
    pub special_tax: Option<AppliedSpecialTax>,
    pub special_tax_rate: SpecialTaxRate,
    pub special_tax_base_usd: Decimal,
    pub special_tax_usd: Decimal,
    pub vat_base_usd: Decimal,
    pub vat_usd: Decimal,
    pub total_taxes_usd: Decimal,
    pub total_usd: Decimal,
    pub exchange_rate: Decimal,
    pub total_clp: Decimal,
    pub documents: Vec<AdditionalDocument>,
    pub agent: AgentRecommendation,
    pub alerts: Vec<Alert>,
}

/// Insurance actually used, `declared` if present (zero included), otherwise 2% of FOB + freight
pub fn resolve_insurance(
    fob_usd: Decimal,
    freight_usd: Decimal,
    declared: Option<Decimal>,
) -> (Decimal, InsuranceMethod) {
    match declared {
        Some(insurance) => (insurance, InsuranceMethod::Declared),
        None => (
            mul(
                "theoretical insurance",
                add("FOB + freight", fob_usd, freight_usd),
                THEORETICAL_INSURANCE_RATE,
            ),
            InsuranceMethod::Theoretical,
        ),
    }
}

/// Amounts are non-negative here, so overflow saturates at `Decimal::MAX`.
fn add(stage: &str, a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        log::warn!("{} overflowed ({} + {}), saturating", stage, a, b);
        Decimal::MAX
    })
}

fn mul(stage: &str, a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        log::warn!("{} overflowed ({} * {}), saturating", stage, a, b);
        Decimal::MAX
    })
}

fn non_negative(field: &str, value: Decimal) -> Decimal {
    if value < Decimal::ZERO {
        log::warn!("{} is negative ({}), treating as zero", field, value);
        Decimal::ZERO
    } else {
        value
    }
}

/// Calculate duties and taxes for a shipment.
///
/// Only the first (most confident) suggestion drives the special tax and document
/// lookups. Negative amounts are treated as zero.
pub fn calculate_duties(
    shipment: &ShipmentInput,
    exchange_rate: Decimal,
    suggestions: &[TariffSuggestion],
) -> CalculationResult {
    let fob = non_negative("fob_usd", shipment.fob_usd);
    let freight = non_negative("freight_usd", shipment.freight_usd);
    let declared = shipment
        .declared_insurance_usd
        .map(|v| non_negative("declared_insurance_usd", v));
    let exchange_rate = non_negative("exchange_rate", exchange_rate);
    let country = shipment.country.trim();

    let mut alerts = Alerts::new();

    let documents = resolve_documents(suggestions);
    for doc in &documents {
        alerts.push(
            AlertKind::RegulatedGoods,
            format!(
                "Este producto podría requerir {} del organismo {}.",
                doc.document, doc.organism
            ),
        );
    }
    if !documents.is_empty() {
        alerts.push(
            AlertKind::CustomsRisk,
            "La falta de certificaciones requeridas puede resultar en multas o el rechazo de la mercancía.",
        );
    }

    let (insurance, insurance_method) = resolve_insurance(fob, freight, declared);
    if insurance_method == InsuranceMethod::Theoretical {
        alerts.push(
            AlertKind::InsuranceEstimate,
            "Seguro teórico (2% de FOB+Flete) aplicado por no ser proporcionado.",
        );
    }
    let cif = add("CIF", add("CIF", fob, freight), insurance);
    log::debug!(
        "CIF {} = FOB {} + freight {} + insurance {} ({})",
        cif,
        fob,
        freight,
        insurance,
        insurance_method
    );

    let (duty_rate, trade_agreement) = if has_trade_agreement(country) {
        alerts.push(
            AlertKind::TradeAgreement,
            "Se aplicó arancel 0% por TLC. Requiere certificado de origen válido.",
        );
        (
            Decimal::ZERO,
            format!(
                "Sí, existe TLC ({}-Chile). Arancel 0% con origen válido.",
                country
            ),
        )
    } else {
        (GENERAL_DUTY_RATE, "Sin TLC aplicable".to_string())
    };
    let base_duty = mul("duty", cif, duty_rate);

    let (used_surcharge, surcharge_rate) = if shipment.is_used {
        let surcharge_rate = duty_rate * USED_GOODS_SURCHARGE;
        alerts.push(
            AlertKind::UsedGoods,
            format!(
                "Se aplicó una sobretasa del 50% al arancel ({} del CIF) por ser producto usado.",
                format_percentage(surcharge_rate)
            ),
        );
        (mul("used surcharge", base_duty, USED_GOODS_SURCHARGE), surcharge_rate)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    let customs_duty = add("customs duty", base_duty, used_surcharge);
    let duty_rate_display = format_percentage(duty_rate + surcharge_rate);
    log::debug!(
        "Duty {} at {} (base {}, used surcharge {})",
        customs_duty,
        duty_rate_display,
        base_duty,
        used_surcharge
    );

    let special_tax_base = add("special tax base", cif, customs_duty);
    let applied = resolve_special_tax(suggestions);
    if let Some(warning) = applied.as_ref().and_then(|a| a.warning) {
        alerts.push(AlertKind::SpecialTax, warning);
    }
    let special_tax_rate = applied
        .as_ref()
        .map_or(SpecialTaxRate::none(), |a| a.display_rate);
    let special_tax = mul(
        "special tax",
        special_tax_base,
        applied.as_ref().map_or(Decimal::ZERO, |a| a.rate),
    );

    // IVA base includes the special taxes
    let vat_base = add("IVA base", special_tax_base, special_tax);
    if special_tax > Decimal::ZERO {
        alerts.push(
            AlertKind::SpecialTax,
            "Importante: Según la normativa, el IVA se calcula sobre la base que incluye los impuestos especiales.",
        );
    }
    let vat = mul("IVA", vat_base, VAT_RATE);

    let total_taxes = add("total taxes", add("total taxes", customs_duty, special_tax), vat);
    let total_usd = add("total", cif, total_taxes);
    let total_clp = mul("CLP total", total_usd, exchange_rate);
    log::debug!(
        "Taxes {} (duty {}, special {}, IVA {}), total {} USD / {} CLP",
        total_taxes,
        customs_duty,
        special_tax,
        vat,
        total_usd,
        total_clp
    );

    let agent = recommend_agent(fob, !documents.is_empty());

    CalculationResult {
        trade_agreement,
        duty_rate_display,
        insurance_method,
        insurance_usd: insurance,
        cif_usd: cif,
        duty_rate,
        base_duty_usd: base_duty,
        used_surcharge_usd: used_surcharge,
        customs_duty_usd: customs_duty,
        special_tax: applied,
        special_tax_rate,
        special_tax_base_usd: special_tax_base,
        special_tax_usd: special_tax,
        vat_base_usd: vat_base,
        vat_usd: vat,
        total_taxes_usd: total_taxes,
        total_usd,
        exchange_rate,
        total_clp,
        documents,
        agent,
        alerts: alerts.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfidenceLevel;
    use crate::tax::agent::AgentRequirement;
    use rust_decimal_macros::dec;

    fn shipment(
        fob: Decimal,
        freight: Decimal,
        insurance: Option<Decimal>,
        country: &str,
        is_used: bool,
    ) -> ShipmentInput {
        ShipmentInput {
            description: String::new(),
            country: country.to_string(),
            fob_usd: fob,
            freight_usd: freight,
            declared_insurance_usd: insurance,
            is_used,
        }
    }

    fn code(code: &str) -> Vec<TariffSuggestion> {
        vec![TariffSuggestion::new(code, "", ConfidenceLevel::High)]
    }

    fn kinds(result: &CalculationResult) -> Vec<AlertKind> {
        result.alerts.iter().map(|a| a.kind).collect()
    }

    fn assert_totals_consistent(r: &CalculationResult) {
        assert_eq!(
            r.total_usd,
            r.cif_usd + r.customs_duty_usd + r.special_tax_usd + r.vat_usd
        );
        assert_eq!(r.total_clp, r.total_usd * r.exchange_rate);
    }

    #[test]
    fn no_trade_agreement_theoretical_insurance() {
        let s = shipment(dec!(1000), dec!(200), None, "India", false);
        let r = calculate_duties(&s, dec!(950), &[]);

        assert_eq!(r.insurance_usd, dec!(24));
        assert_eq!(r.insurance_method, InsuranceMethod::Theoretical);
        assert_eq!(r.cif_usd, dec!(1224));
        assert_eq!(r.duty_rate, dec!(0.06));
        assert_eq!(r.customs_duty_usd, dec!(73.44));
        assert_eq!(r.special_tax_usd, Decimal::ZERO);
        assert_eq!(r.vat_base_usd, dec!(1297.44));
        assert_eq!(r.vat_usd, dec!(246.5136));
        assert_eq!(r.total_taxes_usd, dec!(319.9536));
        assert_eq!(r.total_usd, dec!(1543.9936));
        assert_eq!(r.total_clp, dec!(1466793.92));
        assert_eq!(r.trade_agreement, "Sin TLC aplicable");
        assert_eq!(r.duty_rate_display, "6%");
        assert_totals_consistent(&r);
    }

    #[test]
    fn trade_agreement_zero_duty() {
        let s = shipment(dec!(1000), dec!(200), None, "México", false);
        let r = calculate_duties(&s, dec!(950), &[]);

        assert_eq!(r.duty_rate, Decimal::ZERO);
        assert_eq!(r.customs_duty_usd, Decimal::ZERO);
        assert_eq!(r.vat_base_usd, dec!(1224));
        assert_eq!(r.vat_usd, dec!(232.56));
        assert_eq!(r.total_usd, dec!(1456.56));
        assert_eq!(r.duty_rate_display, "0%");
        assert_eq!(
            r.trade_agreement,
            "Sí, existe TLC (México-Chile). Arancel 0% con origen válido."
        );
        assert!(kinds(&r).contains(&AlertKind::TradeAgreement));
        assert_totals_consistent(&r);
    }

    #[test]
    fn used_tobacco_with_declared_insurance() {
        let s = shipment(dec!(500), dec!(100), Some(dec!(50)), "India", true);
        let r = calculate_duties(&s, dec!(900), &code("2402.20"));

        assert_eq!(r.insurance_usd, dec!(50));
        assert_eq!(r.insurance_method, InsuranceMethod::Declared);
        assert_eq!(r.cif_usd, dec!(650));
        assert_eq!(r.base_duty_usd, dec!(39));
        assert_eq!(r.used_surcharge_usd, dec!(19.5));
        assert_eq!(r.customs_duty_usd, dec!(58.5));
        assert_eq!(r.special_tax_base_usd, dec!(708.5));
        assert_eq!(r.special_tax_usd, dec!(422.9745));
        assert_eq!(r.vat_base_usd, dec!(1131.4745));
        assert_eq!(r.vat_usd, dec!(214.980155));
        assert_eq!(r.total_taxes_usd, dec!(696.454655));
        assert_eq!(r.total_usd, dec!(1346.454655));
        assert_eq!(r.duty_rate_display, "9%");
        assert_eq!(r.special_tax_rate.to_string(), "59.7%");
        assert!(!kinds(&r).contains(&AlertKind::InsuranceEstimate));
        assert_totals_consistent(&r);
    }

    #[test]
    fn declared_zero_insurance_is_honoured() {
        let s = shipment(dec!(1000), dec!(200), Some(Decimal::ZERO), "India", false);
        let r = calculate_duties(&s, dec!(950), &[]);
        assert_eq!(r.insurance_usd, Decimal::ZERO);
        assert_eq!(r.insurance_method, InsuranceMethod::Declared);
        assert_eq!(r.cif_usd, dec!(1200));
        assert!(!kinds(&r).contains(&AlertKind::InsuranceEstimate));
    }

    #[test]
    fn used_goods_surcharge_alert_names_half_rate() {
        let s = shipment(dec!(100), dec!(0), Some(Decimal::ZERO), "India", true);
        let r = calculate_duties(&s, dec!(950), &[]);
        assert_eq!(r.customs_duty_usd, r.base_duty_usd * dec!(1.5));
        let alert = r
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::UsedGoods)
            .unwrap();
        assert_eq!(
            alert.message,
            "Se aplicó una sobretasa del 50% al arancel (3% del CIF) por ser producto usado."
        );
    }

    #[test]
    fn used_goods_under_trade_agreement() {
        let s = shipment(dec!(100), dec!(10), None, "China", true);
        let r = calculate_duties(&s, dec!(950), &[]);
        assert_eq!(r.customs_duty_usd, Decimal::ZERO);
        assert_eq!(r.duty_rate_display, "0%");
        let alert = r
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::UsedGoods)
            .unwrap();
        assert!(alert.message.contains("(0% del CIF)"));
    }

    #[test]
    fn vat_base_includes_special_tax() {
        let s = shipment(dec!(100), dec!(0), Some(Decimal::ZERO), "India", false);
        let r = calculate_duties(&s, dec!(950), &code("2208.30"));
        // CIF 100, duty 6, special 31.5% of 106
        assert_eq!(r.special_tax_usd, dec!(33.39));
        assert_eq!(r.vat_base_usd, dec!(139.39));
        assert_ne!(r.vat_base_usd, r.cif_usd);
        assert_eq!(r.vat_usd, dec!(139.39) * dec!(0.19));
        assert_eq!(
            r.alerts.last().unwrap().message,
            "Importante: Según la normativa, el IVA se calcula sobre la base que incluye los impuestos especiales."
        );
        assert_totals_consistent(&r);
    }

    #[test]
    fn label_only_rate_adds_no_special_tax() {
        let s = shipment(dec!(20000), dec!(1000), None, "Alemania", false);
        let r = calculate_duties(&s, dec!(950), &code("8703.23"));
        assert_eq!(r.special_tax_usd, Decimal::ZERO);
        assert_eq!(r.special_tax_rate, SpecialTaxRate::Label("Fórmula"));
        let special_alerts: Vec<_> = r
            .alerts
            .iter()
            .filter(|a| a.kind == AlertKind::SpecialTax)
            .collect();
        // warning only, no IVA base notice
        assert_eq!(special_alerts.len(), 1);
        assert!(special_alerts[0].message.contains("impuesto verde"));
    }

    #[test]
    fn huge_amounts_saturate_instead_of_panicking() {
        let s = shipment(dec!(1e26), dec!(0), None, "India", true);
        let r = calculate_duties(&s, dec!(950), &code("2402.20"));
        assert_eq!(r.total_clp, Decimal::MAX);
        assert!(r.total_usd >= r.cif_usd);
        assert!(r.vat_usd > Decimal::ZERO);
    }

    #[test]
    fn alert_emission_order() {
        // regulated (85), theoretical insurance, TLC, used, special tax warning + IVA notice
        let s = shipment(dec!(500), dec!(50), None, "China", true);
        let suggestions = code("8517.62");
        let r = calculate_duties(&s, dec!(950), &suggestions);
        assert_eq!(
            kinds(&r),
            vec![
                AlertKind::Disclaimer,
                AlertKind::RegulatedGoods,
                AlertKind::RegulatedGoods,
                AlertKind::CustomsRisk,
                AlertKind::InsuranceEstimate,
                AlertKind::TradeAgreement,
                AlertKind::UsedGoods,
            ]
        );

        let s = shipment(dec!(500), dec!(50), None, "India", true);
        let r = calculate_duties(&s, dec!(950), &code("2202.10"));
        assert_eq!(
            kinds(&r),
            vec![
                AlertKind::Disclaimer,
                AlertKind::InsuranceEstimate,
                AlertKind::UsedGoods,
                AlertKind::SpecialTax,
                AlertKind::SpecialTax,
            ]
        );
        assert!(r.alerts[3].message.contains("Ley 20.606"));
    }

    #[test]
    fn regulated_alerts_name_document_and_organism() {
        let s = shipment(dec!(100), dec!(10), None, "India", false);
        let r = calculate_duties(&s, dec!(950), &code("8517.62"));
        assert_eq!(
            r.alerts[1].message,
            "Este producto podría requerir Certificación SUBTEL del organismo SUBTEL."
        );
        assert_eq!(
            r.alerts[2].message,
            "Este producto podría requerir Certificación SEC (Sello) del organismo SEC."
        );
        assert_eq!(r.agent.requirement, AgentRequirement::Recommended);
    }

    #[test]
    fn high_fob_always_requires_agent() {
        let s = shipment(dec!(1500), dec!(10), None, "India", false);
        let r = calculate_duties(&s, dec!(950), &code("8517.62"));
        assert_eq!(r.agent.requirement, AgentRequirement::Mandatory);

        let r = calculate_duties(&s, dec!(950), &[]);
        assert_eq!(r.agent.requirement, AgentRequirement::Mandatory);
    }

    #[test]
    fn low_value_unregulated_is_optional() {
        let s = shipment(dec!(100), dec!(10), None, "India", false);
        let r = calculate_duties(&s, dec!(950), &code("6402.99"));
        assert_eq!(r.agent.requirement, AgentRequirement::Optional);
        assert!(r.documents.is_empty());
    }

    #[test]
    fn negative_inputs_clamped_to_zero() {
        let s = shipment(dec!(-100), dec!(-5), Some(dec!(-1)), "India", false);
        let r = calculate_duties(&s, dec!(-950), &[]);
        assert_eq!(r.cif_usd, Decimal::ZERO);
        assert_eq!(r.total_usd, Decimal::ZERO);
        assert_eq!(r.exchange_rate, Decimal::ZERO);
        assert_eq!(r.insurance_method, InsuranceMethod::Declared);
    }

    #[test]
    fn resolve_insurance_methods() {
        assert_eq!(
            resolve_insurance(dec!(1000), dec!(200), None),
            (dec!(24), InsuranceMethod::Theoretical)
        );
        assert_eq!(
            resolve_insurance(dec!(1000), dec!(200), Some(Decimal::ZERO)),
            (Decimal::ZERO, InsuranceMethod::Declared)
        );
    }
}
