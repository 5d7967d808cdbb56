//! Batch command - estimate many pre-classified shipments from CSV

use super::ExchangeRateArgs;
use crate::core::{ConfidenceLevel, ShipmentInput, TariffSuggestion};
use crate::tax::calculate_duties;
use anyhow::Context;
use arancel_derive::CsvSchema;
use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BatchCommand {
    /// CSV file of shipments (see `schema csv-fields`). Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    #[command(flatten)]
    exchange_rate: ExchangeRateArgs,
}

/// One shipment per CSV row
#[derive(Debug, Clone, Deserialize, CsvSchema)]
pub struct BatchRecord {
    /// Identifier echoed in the output
    #[serde(default)]
    pub id: Option<String>,
    /// Product description
    #[serde(default)]
    pub description: String,
    /// Country of origin (e.g. China, México, Alemania)
    pub country: String,
    /// FOB value in USD
    pub fob_usd: Decimal,
    /// Freight in USD
    pub freight_usd: Decimal,
    /// Declared insurance in USD (empty applies the theoretical 2%)
    pub insurance_usd: Option<Decimal>,
    /// true for used goods (empty means new)
    #[serde(default)]
    pub is_used: Option<bool>,
    /// HS code of the product (e.g. 8517.62)
    pub tariff_code: Option<String>,
}

impl BatchRecord {
    fn shipment(&self) -> ShipmentInput {
        ShipmentInput {
            description: self.description.clone(),
            country: self.country.trim().to_string(),
            fob_usd: self.fob_usd,
            freight_usd: self.freight_usd,
            declared_insurance_usd: self.insurance_usd,
            is_used: self.is_used.unwrap_or(false),
        }
    }

    fn suggestions(&self) -> Vec<TariffSuggestion> {
        self.tariff_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| vec![TariffSuggestion::new(code, "", ConfidenceLevel::High)])
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct BatchResult {
    id: String,
    country: String,
    tariff_code: String,
    insurance_method: &'static str,
    cif_usd: Decimal,
    duty_rate: String,
    customs_duty_usd: Decimal,
    special_tax_usd: Decimal,
    vat_usd: Decimal,
    total_taxes_usd: Decimal,
    total_usd: Decimal,
    total_clp: Decimal,
    agent: &'static str,
    documents: String,
}

impl BatchCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let records = self.read_records()?;
        let exchange_rate = self.exchange_rate.resolve()?;
        log::info!(
            "Estimating {} shipments at {} CLP/USD",
            records.len(),
            exchange_rate
        );
        write_results(&records, exchange_rate, io::stdout())
    }

    fn read_records(&self) -> anyhow::Result<Vec<BatchRecord>> {
        if self.file.as_os_str() == "-" {
            let mut buffer = Vec::new();
            io::stdin().lock().read_to_end(&mut buffer)?;
            if buffer.is_empty() {
                anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
            }
            read_csv(buffer.as_slice())
        } else {
            let file = File::open(&self.file)
                .with_context(|| format!("Failed to open {}", self.file.display()))?;
            read_csv(file)
        }
    }
}

pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<BatchRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let line = i + 2;
        let record: BatchRecord = result.with_context(|| format!("Invalid row at line {}", line))?;
        record
            .shipment()
            .validate()
            .with_context(|| format!("Invalid shipment at line {}", line))?;
        records.push(record);
    }
    Ok(records)
}

fn write_results<W: Write>(
    records: &[BatchRecord],
    exchange_rate: Decimal,
    writer: W,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (i, record) in records.iter().enumerate() {
        let suggestions = record.suggestions();
        let result = calculate_duties(&record.shipment(), exchange_rate, &suggestions);
        let documents = result
            .documents
            .iter()
            .map(|d| format!("{} ({})", d.document, d.organism))
            .collect::<Vec<_>>()
            .join("; ");
        wtr.serialize(BatchResult {
            id: record.id.clone().unwrap_or_else(|| (i + 1).to_string()),
            country: record.country.clone(),
            tariff_code: suggestions.first().map(|s| s.code.clone()).unwrap_or_default(),
            insurance_method: result.insurance_method.label(),
            cif_usd: result.cif_usd.normalize(),
            duty_rate: result.duty_rate_display,
            customs_duty_usd: result.customs_duty_usd.normalize(),
            special_tax_usd: result.special_tax_usd.normalize(),
            vat_usd: result.vat_usd.normalize(),
            total_taxes_usd: result.total_taxes_usd.normalize(),
            total_usd: result.total_usd.normalize(),
            total_clp: result.total_clp.normalize(),
            agent: result.agent.requirement.label(),
            documents,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CSV: &str = "\
id,description,country,fob_usd,freight_usd,insurance_usd,is_used,tariff_code
a,cigarrillos,India,500,100,50,true,2402.20
b,zapatillas,México,1000,200,,false,
";

    #[test]
    fn reads_records() {
        let records = read_csv(CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].insurance_usd, Some(dec!(50)));
        assert_eq!(records[0].is_used, Some(true));
        assert_eq!(records[1].insurance_usd, None);
        assert!(records[1].suggestions().is_empty());
    }

    #[test]
    fn blank_cells_are_optional() {
        let csv = "country,fob_usd,freight_usd,insurance_usd,is_used,tariff_code\nIndia,100,10,,,\n";
        let records = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].is_used, None);
        assert!(!records[0].shipment().is_used);
        assert_eq!(records[0].shipment().declared_insurance_usd, None);
    }

    #[test]
    fn invalid_country_reports_line() {
        let csv = "country,fob_usd,freight_usd,insurance_usd,tariff_code\nAtlantis,1,1,,\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid shipment at line 2");
    }

    #[test]
    fn writes_results() {
        let records = read_csv(CSV.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_results(&records, dec!(1000), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert!(lines[0].starts_with("id,country,tariff_code,insurance_method,cif_usd"));
        assert!(lines[1].starts_with("a,India,2402.20,declarado,650,9%,58.5"));
        assert!(lines[1].contains("1346.454655"));
        assert!(lines[2].starts_with("b,México,,teórico 2%,1224,0%,0"));
        assert!(lines[2].contains("1456.56"));
    }

    #[test]
    fn schema_lists_columns_in_order() {
        assert_eq!(
            BatchRecord::csv_columns(),
            &[
                "id",
                "description",
                "country",
                "fob_usd",
                "freight_usd",
                "insurance_usd",
                "is_used",
                "tariff_code"
            ]
        );
        let required: Vec<_> = BatchRecord::csv_fields()
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, vec!["country", "fob_usd", "freight_usd"]);
    }
}
