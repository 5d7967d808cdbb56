//! Schema command - print expected input formats

use super::batch::BatchRecord;
use super::estimate::EstimateInput;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema or csv-header
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for `estimate --input`
    JsonSchema,
    /// CSV header row for `batch`
    CsvHeader,
    /// CSV column descriptions for `batch`
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(EstimateInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => println!("{}", BatchRecord::csv_columns().join(",")),
            SchemaFormat::CsvFields => print_csv_fields(),
        }
        Ok(())
    }
}

fn print_csv_fields() {
    println!("CSV Input Format");
    println!("================");
    println!();
    for field in BatchRecord::csv_fields() {
        let req = if field.required { "required" } else { "optional" };
        println!("{:20} ({:8})  {}", field.name, req, field.description);
    }
    println!();
    println!("Amounts are USD. tariff_code is matched by prefix against the special tax table.");
}
