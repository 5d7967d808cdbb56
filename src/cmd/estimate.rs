//! Estimate command - duties and taxes for a single shipment

use super::ExchangeRateArgs;
use crate::catalog::{recommend_catalog, Catalog};
use crate::core::{ShipmentInput, TariffSuggestion};
use crate::providers::classifier::normalize_suggestions;
use crate::providers::{Classifier, JsonFileClassifier, StaticClassifier};
use crate::tax::chile::{format_clp, format_percentage, format_usd, VAT_RATE};
use crate::tax::{calculate_duties, CalculationResult, InsuranceMethod};
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct EstimateCommand {
    /// JSON file with the shipment (and optionally its suggestions). See `schema`.
    #[arg(short, long, conflicts_with_all = ["country", "fob", "freight"])]
    input: Option<PathBuf>,

    /// Product description
    #[arg(short, long, default_value = "")]
    description: String,

    /// Country of origin (e.g. "China", "Estados Unidos")
    #[arg(short, long)]
    country: Option<String>,

    /// FOB value in USD
    #[arg(long)]
    fob: Option<Decimal>,

    /// Freight in USD
    #[arg(long)]
    freight: Option<Decimal>,

    /// Declared insurance in USD. When omitted 2% of FOB + freight is used.
    #[arg(long)]
    insurance: Option<Decimal>,

    /// The goods are used
    #[arg(long)]
    used: bool,

    /// HS code, most confident first (repeat for alternatives)
    #[arg(long = "code")]
    codes: Vec<String>,

    /// JSON file with classifier suggestions (or "-" for stdin)
    #[arg(short, long, conflicts_with = "codes")]
    suggestions: Option<PathBuf>,

    /// Product photo passed to the classifier
    #[arg(long)]
    image: Option<PathBuf>,

    #[command(flatten)]
    exchange_rate: ExchangeRateArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// Input document for `estimate --input`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EstimateInput {
    #[serde(flatten)]
    pub shipment: ShipmentInput,
    /// Classifier suggestions, most confident first
    #[serde(default)]
    pub suggestions: Option<Vec<TariffSuggestion>>,
}

/// Estimate output: the calculation plus classification and catalog
#[derive(Debug, Serialize)]
struct Estimate<'a> {
    description: &'a str,
    country: &'a str,
    suggestions: &'a [TariffSuggestion],
    #[serde(flatten)]
    result: &'a CalculationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<Catalog>,
}

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Concepto")]
    concept: String,
    #[tabled(rename = "Tasa")]
    rate: String,
    #[tabled(rename = "USD")]
    usd: String,
}

impl BreakdownRow {
    fn new(concept: &str, rate: impl Into<String>, usd: Decimal) -> Self {
        BreakdownRow {
            concept: concept.to_string(),
            rate: rate.into(),
            usd: format_usd(usd),
        }
    }
}

impl EstimateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (mut shipment, provided) = self.shipment()?;
        shipment.country = shipment.country.trim().to_string();
        shipment.validate()?;

        let suggestions = match provided {
            Some(suggestions) => {
                normalize_suggestions(suggestions).map_err(|e| anyhow::anyhow!(e.user_message()))?
            }
            None => self.classify(&shipment.description)?,
        };
        let exchange_rate = self.exchange_rate.resolve()?;

        let result = calculate_duties(&shipment, exchange_rate, &suggestions);
        let catalog = recommend_catalog(&shipment.description, &suggestions);

        let estimate = Estimate {
            description: &shipment.description,
            country: &shipment.country,
            suggestions: &suggestions,
            result: &result,
            catalog,
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(&estimate)?);
        } else {
            print_estimate(&estimate, &shipment);
        }
        Ok(())
    }

    fn shipment(&self) -> anyhow::Result<(ShipmentInput, Option<Vec<TariffSuggestion>>)> {
        if let Some(path) = &self.input {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            let input: EstimateInput = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid estimate input {}", path.display()))?;
            return Ok((input.shipment, input.suggestions));
        }

        let country = self
            .country
            .clone()
            .context("--country is required (or provide --input)")?;
        let fob_usd = self.fob.context("--fob is required (or provide --input)")?;
        let freight_usd = self
            .freight
            .context("--freight is required (or provide --input)")?;
        let shipment = ShipmentInput {
            description: self.description.clone(),
            country,
            fob_usd,
            freight_usd,
            declared_insurance_usd: self.insurance,
            is_used: self.used,
        };
        Ok((shipment, None))
    }

    fn classify(&self, description: &str) -> anyhow::Result<Vec<TariffSuggestion>> {
        let image = match &self.image {
            Some(path) => Some(
                std::fs::read(path)
                    .with_context(|| format!("Failed to read image {}", path.display()))?,
            ),
            None => None,
        };
        let classifier: Box<dyn Classifier> = match &self.suggestions {
            Some(path) => Box::new(JsonFileClassifier::new(path.clone())),
            None => Box::new(StaticClassifier::new(self.codes.clone())),
        };
        classifier
            .classify(description, image.as_deref())
            .map_err(|err| {
                log::error!("{}", err);
                anyhow::anyhow!(err.user_message())
            })
    }
}

fn print_estimate(estimate: &Estimate, shipment: &ShipmentInput) {
    let result = estimate.result;

    println!();
    if estimate.description.is_empty() {
        println!("ESTIMACIÓN DE IMPORTACIÓN ({})", estimate.country);
    } else {
        println!(
            "ESTIMACIÓN DE IMPORTACIÓN: {} ({})",
            estimate.description, estimate.country
        );
    }
    println!();

    if estimate.suggestions.is_empty() {
        println!("Código HS: sin clasificación");
    } else {
        for (i, s) in estimate.suggestions.iter().enumerate() {
            let marker = if i == 0 { "*" } else { " " };
            if s.description.is_empty() {
                println!("{} {} [{}]", marker, s.code, s.confidence);
            } else {
                println!("{} {} {} [{}]", marker, s.code, s.description, s.confidence);
            }
        }
    }
    println!("TLC: {}", result.trade_agreement);
    if result.insurance_method == InsuranceMethod::Theoretical {
        println!(
            "Seguro: {} USD ({})",
            format_usd(result.insurance_usd),
            result.insurance_method
        );
    }
    println!();

    let special_label = result
        .special_tax
        .as_ref()
        .map_or("Impuesto especial".to_string(), |s| {
            format!("Impuesto especial ({})", s.sub_category)
        });
    let rows = vec![
        BreakdownRow::new("Valor FOB", "", shipment.fob_usd),
        BreakdownRow::new("Flete", "", shipment.freight_usd),
        BreakdownRow::new("Seguro", result.insurance_method.label(), result.insurance_usd),
        BreakdownRow::new("Valor CIF", "", result.cif_usd),
        BreakdownRow::new(
            "Derecho ad valorem",
            result.duty_rate_display.clone(),
            result.customs_duty_usd,
        ),
        BreakdownRow::new(
            &special_label,
            result.special_tax_rate.to_string(),
            result.special_tax_usd,
        ),
        BreakdownRow::new("IVA", format_percentage(VAT_RATE), result.vat_usd),
        BreakdownRow::new("Total impuestos", "", result.total_taxes_usd),
        BreakdownRow::new("Costo total", "", result.total_usd),
    ];
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!();
    println!(
        "Total CLP: ${} (tipo de cambio {})",
        format_clp(result.total_clp),
        result.exchange_rate.normalize()
    );
    println!();

    if !result.documents.is_empty() {
        println!("DOCUMENTOS ADICIONALES");
        for doc in &result.documents {
            println!("  - {}: {} ({})", doc.organism, doc.document, doc.reason);
        }
        println!();
    }

    println!("AGENTE DE ADUANAS: {}", result.agent.requirement);
    println!("  {}", result.agent.message);
    println!();

    println!("ALERTAS");
    for alert in &result.alerts {
        println!("  [{}] {}", alert.kind, alert.message);
    }

    if let Some(catalog) = &estimate.catalog {
        println!();
        println!(
            "Catálogo recomendado: {} - {} (${} CLP)",
            catalog.name,
            catalog.url,
            format_clp(Decimal::from(catalog.price_clp))
        );
    }
}
