//! Rules command - show the static rule tables

use crate::core::{
    validate_certification_rules, validate_special_tax_rules, CertificationRule, SpecialTaxRule,
    CERTIFICATION_RULES, SPECIAL_TAX_RULES, TRADE_AGREEMENT_COUNTRIES,
};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct RulesCommand {
    /// Which table to show
    #[arg(value_enum, default_value = "all")]
    table: RuleTable,

    /// Validate table ordering and exit with an error if a rule is shadowed
    #[arg(long)]
    check: bool,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuleTable {
    All,
    /// Special taxes by tariff prefix (first match wins)
    SpecialTax,
    /// Certifications by tariff chapter (all matches apply)
    Certifications,
    /// Countries with a trade agreement
    Tlc,
}

#[derive(Serialize)]
struct RulesOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    special_tax: Option<&'static [SpecialTaxRule]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    certifications: Option<&'static [CertificationRule]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trade_agreement_countries: Option<&'static [&'static str]>,
}

#[derive(Tabled)]
struct SpecialTaxRow {
    #[tabled(rename = "#")]
    order: usize,
    #[tabled(rename = "Prefijos")]
    prefixes: String,
    #[tabled(rename = "Subcategoría")]
    sub_category: &'static str,
    #[tabled(rename = "Categoría")]
    category: &'static str,
    #[tabled(rename = "Tasa")]
    rate: &'static str,
    #[tabled(rename = "Advertencia")]
    warning: &'static str,
}

#[derive(Tabled)]
struct CertificationRow {
    #[tabled(rename = "Capítulos")]
    chapters: String,
    #[tabled(rename = "Organismo")]
    organism: &'static str,
    #[tabled(rename = "Documento")]
    document: &'static str,
    #[tabled(rename = "Categoría")]
    category: &'static str,
}

impl RulesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        if self.check {
            validate_special_tax_rules(SPECIAL_TAX_RULES)?;
            validate_certification_rules(CERTIFICATION_RULES)?;
            log::info!(
                "{} special tax rules and {} certification rules OK",
                SPECIAL_TAX_RULES.len(),
                CERTIFICATION_RULES.len()
            );
        }

        let show = |table: RuleTable| self.table == RuleTable::All || self.table == table;

        if self.json {
            let output = RulesOutput {
                special_tax: show(RuleTable::SpecialTax).then_some(SPECIAL_TAX_RULES),
                certifications: show(RuleTable::Certifications).then_some(CERTIFICATION_RULES),
                trade_agreement_countries: show(RuleTable::Tlc)
                    .then_some(TRADE_AGREEMENT_COUNTRIES),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if show(RuleTable::SpecialTax) {
            print_special_tax_rules();
        }
        if show(RuleTable::Certifications) {
            print_certification_rules();
        }
        if show(RuleTable::Tlc) {
            println!("PAÍSES CON TLC");
            println!();
            println!("{}", TRADE_AGREEMENT_COUNTRIES.join(", "));
            println!();
        }
        Ok(())
    }
}

fn print_special_tax_rules() {
    let rows: Vec<SpecialTaxRow> = SPECIAL_TAX_RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| SpecialTaxRow {
            order: i + 1,
            prefixes: rule.tariff_prefixes.join(", "),
            sub_category: rule.sub_category,
            category: rule.category.label(),
            rate: rule.rate_label,
            warning: rule.warning.unwrap_or(""),
        })
        .collect();

    println!("IMPUESTOS ESPECIALES");
    println!();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();
}

fn print_certification_rules() {
    let rows: Vec<CertificationRow> = CERTIFICATION_RULES
        .iter()
        .map(|rule| CertificationRow {
            chapters: rule.tariff_chapters.join(", "),
            organism: rule.organism,
            document: rule.document,
            category: rule.category,
        })
        .collect();

    println!("CERTIFICACIONES");
    println!();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();
}
