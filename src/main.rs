use clap::{Parser, Subcommand};

mod catalog;
mod cmd;
mod core;
mod providers;
mod tax;

/// Estimate Chilean import duties, IVA and special taxes for a shipment
#[derive(Parser, Debug)]
#[command(name = "arancel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate duties and taxes for a single shipment
    Estimate(cmd::estimate::EstimateCommand),
    /// Estimate a CSV of pre-classified shipments
    Batch(cmd::batch::BatchCommand),
    /// Show the special tax, certification and trade agreement tables
    Rules(cmd::rules::RulesCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Estimate(cmd) => cmd.exec(),
        Command::Batch(cmd) => cmd.exec(),
        Command::Rules(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
