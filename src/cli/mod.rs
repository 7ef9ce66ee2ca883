use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "posledger")]
#[command(
    version,
    about = "POS export processing, cash receipts and supplier discount reports"
)]
#[command(
    long_about = "Downloads Z reports and transaction exports from the POS portal, files the daily collected cash with the accounting ledger, and mails a weekly report of discounts per supplier."
)]
pub struct Cli {
    /// Path to config.toml (defaults to POSLEDGER_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download today's Z report, file the cash receipt and mail the receipt text
    Daily,

    /// Build and mail the weekly discount report
    Weekly {
        /// Report year (defaults to the current ISO year)
        #[arg(long)]
        year: Option<i32>,

        /// Report week, 1-53 (defaults to the week containing today; week 1 holds January 1st)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=53))]
        week: Option<u32>,
    },

    /// Resolve product codes to suppliers and print where each name came from
    Resolve {
        /// Product codes or barcodes
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Inspect or override the cash receipt document counter
    DocNumber {
        #[command(subcommand)]
        action: DocNumberCommands,
    },
}

#[derive(Subcommand)]
pub enum DocNumberCommands {
    /// Print the next document number
    Show,

    /// Set the next document number
    Set {
        number: u64,
    },
}
