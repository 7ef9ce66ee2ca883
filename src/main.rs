mod cli;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, DocNumberCommands};
use posledger::b1::B1Client;
use posledger::config::Settings;
use posledger::ledger::DocumentNumberStore;
use posledger::notify::SmtpMailer;
use posledger::pipeline::{
    run_daily, run_weekly, week_of, Collaborators, DailyOutcome, WeeklyOutcome,
};
use posledger::pos::PosClient;
use posledger::suppliers::{CatalogLookup, OfflineCatalog, PrefixRules, SupplierResolver};
use posledger::utils::format_eur;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Daily => handle_daily(&settings),
        Commands::Weekly { year, week } => handle_weekly(&settings, year, week),
        Commands::Resolve { codes } => handle_resolve(&settings, &codes),
        Commands::DocNumber { action } => handle_doc_number(&settings, action),
    }
}

fn catalog_for<'a>(settings: &Settings, b1: &'a B1Client) -> Box<dyn CatalogLookup + 'a> {
    if settings.b1.api_key.is_empty() {
        info!("No B1 API key configured; remote supplier lookups disabled");
        Box::new(OfflineCatalog)
    } else {
        Box::new(b1)
    }
}

fn handle_daily(settings: &Settings) -> Result<()> {
    let mut pos = PosClient::new(&settings.pos)?;
    let b1 = B1Client::new(&settings.b1)?;
    let catalog = catalog_for(settings, &b1);
    let mailer = SmtpMailer::new(&settings.email);
    let mut collab = Collaborators {
        pos: &mut pos,
        catalog: catalog.as_ref(),
        ledger: &b1,
        notifier: &mailer,
    };

    match run_daily(settings, &mut collab, Local::now().naive_local())? {
        DailyOutcome::AlreadyDone => println!("Daily report already done for today"),
        DailyOutcome::TooEarly => println!("Too early for the daily report"),
        DailyOutcome::Discarded => println!("{} Z report export was unusable", "✗".red().bold()),
        DailyOutcome::Completed {
            receipt_filed,
            emailed,
        } => {
            println!("{} Daily report done", "✓".green().bold());
            println!("  Cash receipt filed: {}", yes_no(receipt_filed));
            println!("  Receipt emailed:    {}", yes_no(emailed));
        }
    }
    Ok(())
}

fn handle_weekly(settings: &Settings, year: Option<i32>, week: Option<u32>) -> Result<()> {
    let (this_year, this_week) = week_of(Local::now().date_naive());
    let year = year.unwrap_or(this_year);
    let week = week.unwrap_or(this_week);

    let mut pos = PosClient::new(&settings.pos)?;
    let b1 = B1Client::new(&settings.b1)?;
    let catalog = catalog_for(settings, &b1);
    let mailer = SmtpMailer::new(&settings.email);
    let mut collab = Collaborators {
        pos: &mut pos,
        catalog: catalog.as_ref(),
        ledger: &b1,
        notifier: &mailer,
    };

    match run_weekly(settings, &mut collab, year, week)? {
        WeeklyOutcome::AlreadyDone => {
            println!("Weekly report {} week {} already done", year, week)
        }
        WeeklyOutcome::Discarded => {
            println!("{} Transactions export was unusable", "✗".red().bold())
        }
        WeeklyOutcome::Completed {
            rows,
            unknown,
            total_discount,
            report_path,
            workbook_path,
            emailed,
        } => {
            println!(
                "{} Weekly report {} week {}: {} discounted lines",
                "✓".green().bold(),
                year,
                week,
                rows
            );
            println!("  Discounts: {}", format_eur(total_discount));
            println!("  Report:    {}", report_path.display());
            println!("  Workbook:  {}", workbook_path.display());
            println!("  Emailed:   {}", yes_no(emailed));
            if unknown > 0 {
                println!(
                    "  {} {} product codes without a supplier",
                    "!".yellow().bold(),
                    unknown
                );
            }
        }
    }
    Ok(())
}

fn handle_resolve(settings: &Settings, codes: &[String]) -> Result<()> {
    #[derive(Tabled)]
    struct ResolutionRow {
        #[tabled(rename = "Code")]
        code: String,
        #[tabled(rename = "Supplier")]
        supplier: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let b1 = B1Client::new(&settings.b1)?;
    let catalog = catalog_for(settings, &b1);
    let mut resolver = SupplierResolver::open(
        settings.mapping_path(),
        PrefixRules::from_settings(&settings.prefix_rules),
        catalog,
    )?;

    let rows: Vec<ResolutionRow> = codes
        .iter()
        .map(|code| {
            let (supplier, source) = resolver.resolve_with_source(code);
            ResolutionRow {
                code: code.clone(),
                supplier,
                source: source.as_str().to_string(),
            }
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn handle_doc_number(settings: &Settings, action: DocNumberCommands) -> Result<()> {
    let store = DocumentNumberStore::new(settings.counter_path());
    match action {
        DocNumberCommands::Show => {
            let next = store.read()?;
            println!("{}", next);
        }
        DocNumberCommands::Set { number } => {
            store.save(number)?;
            println!("{} Next document number set to {}", "✓".green().bold(), number);
        }
    }
    Ok(())
}

fn yes_no(flag: bool) -> colored::ColoredString {
    if flag {
        "yes".green()
    } else {
        "no".red()
    }
}
