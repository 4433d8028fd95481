use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use finance_tracker::book::Book;
use finance_tracker::config::Config;
use finance_tracker::core::forecast::forecast_spending;
use finance_tracker::core::{EntryFilter, PeriodSummary, YearMonth};
use finance_tracker::server::{self, AppState};
use finance_tracker::storage::JsonFileStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "finance", about = "Personal finance tracker")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API
    Serve {
        /// Overrides `bind` from the config file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print a party statement with running balances
    Balance {
        /// Party id or exact name
        #[arg(long)]
        party: String,
        /// all, credit or debit
        #[arg(long, default_value = "all")]
        filter: String,
    },
    /// Print income and expense totals
    Summary {
        /// Month as YYYY-MM; all time when omitted
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Project spending for the next three months
    Forecast {
        /// Last month of history, defaults to the current month
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Compare budgets with spending
    Budgets {
        #[arg(long)]
        month: Option<YearMonth>,
    },
}

fn init_tracing(cfg: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn find_party(book: &Book, key: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    if let Ok(id) = Uuid::parse_str(key) {
        return Ok(id);
    }
    book.party_views()?
        .into_iter()
        .find(|p| p.party.name == key)
        .map(|p| p.party.id)
        .ok_or_else(|| format!("no party named {key:?}").into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&PathBuf::from("config.toml"))?,
    };
    init_tracing(&cfg);

    let store = JsonFileStore::new(cfg.database_path());
    debug!(path = %store.path().display(), "opening book");
    let book = Book::new(store);
    let symbol = cfg.currency_symbol();
    let this_month = YearMonth::of(Book::today());

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.bind = bind;
            }
            let addr = cfg.bind_addr()?;
            info!(data_dir = %cfg.data_dir.display(), require_auth = cfg.require_auth, "starting");
            let state = Arc::new(AppState::from_config(&cfg));
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::serve(addr, state))?;
        }
        Commands::Balance { party, filter } => {
            let id = find_party(&book, &party)?;
            let filter: EntryFilter = filter.parse()?;
            let view = book.party_view(id)?;
            let statement = book.statement(id, filter)?;
            println!("{} (opening {symbol}{})", view.party.name, view.party.opening_balance);
            for line in &statement.lines {
                println!(
                    "{} | {:<10} | {:>12} | {:>12} | {}",
                    line.entry.date,
                    line.entry.entry_type,
                    line.entry.amount,
                    line.running_balance,
                    line.entry.description.as_deref().unwrap_or("")
                );
            }
            let totals = statement.totals;
            println!(
                "purchases {symbol}{} | payments {symbol}{} | balance {symbol}{}",
                totals.total_purchases, totals.total_payments, totals.current_balance
            );
        }
        Commands::Summary { month } => {
            let summary = PeriodSummary::compute(&book.snapshot()?, month)?;
            let label = month.map(|m| m.to_string()).unwrap_or_else(|| "all time".into());
            println!("{label}");
            println!("income    {symbol}{}", summary.total_income);
            println!("expenses  {symbol}{}", summary.total_expenses);
            println!("net       {symbol}{} ({}% saved)", summary.net, summary.savings_rate);
            println!("lent      {symbol}{}", summary.outstanding_lent);
            println!("borrowed  {symbol}{}", summary.outstanding_borrowed);
        }
        Commands::Forecast { month } => {
            let db = book.snapshot()?;
            let forecast = forecast_spending(&db.expenses, month.unwrap_or(this_month))?;
            for point in &forecast.history {
                println!("{}  {symbol}{}", point.month, point.amount);
            }
            println!("growth per month {symbol}{}", forecast.growth_rate);
            for point in &forecast.projected {
                println!("{}  {symbol}{} (projected)", point.month, point.amount);
            }
        }
        Commands::Budgets { month } => {
            let db = book.snapshot()?;
            let reference = month.unwrap_or(this_month);
            for budget in &db.budgets {
                let status = budget.status(&db.expenses, reference)?;
                println!(
                    "{:<16} {symbol}{} / {symbol}{} ({}%){}",
                    status.category,
                    status.spent,
                    status.limit,
                    status.percent_used,
                    if status.over_budget { " over" } else { "" }
                );
            }
        }
    }

    Ok(())
}
