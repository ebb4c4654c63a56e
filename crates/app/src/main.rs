use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use ledger::{EventKind, Ledger, NewTransaction, money};
use migration::{Migrator, MigratorTrait};
use rates::RatesClient;
use rust_decimal::Decimal;
use tokio::sync::watch;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Personal expense ledger with Treasury exchange-rate lookups")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new transaction.
    Add {
        #[arg(long)]
        description: String,
        /// Amount in dollars, e.g. 12.50.
        #[arg(long)]
        amount: Decimal,
        /// Transaction date (RFC 3339); defaults to now.
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    /// List active transactions.
    List,
    /// Soft-delete a transaction by its unique identifier.
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// Print the running total of active transactions.
    Total,
    /// List the currency names published by the Treasury.
    Currencies,
    /// List exchange rates within an inclusive date range.
    Rates {
        #[arg(long)]
        min_date: NaiveDate,
        #[arg(long)]
        max_date: NaiveDate,
    },
    /// Show a transaction's value in a foreign currency, using the most
    /// recent rate published within the date range.
    Convert {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        min_date: NaiveDate,
        #[arg(long)]
        max_date: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},ledger={level},rates={level}",
            level = settings.app.level
        ))
        .init();

    let url = cli
        .database_url
        .unwrap_or_else(|| format!("sqlite:{}?mode=rwc", settings.database.path));
    let db = sea_orm::Database::connect(url.as_str()).await?;
    Migrator::up(&db, None).await?;
    tracing::debug!(%url, "database ready");

    let ledger = Ledger::builder().database(db).build();
    let rates_client = RatesClient::with_base_url(&settings.rates.base_url);

    match cli.command {
        Command::Add {
            description,
            amount,
            date,
        } => {
            let subscription = ledger.events().subscribe(EventKind::TransactionAdded, |tx| {
                println!(
                    "recorded {} ({}) as {}",
                    tx.description,
                    money::cents_to_currency_string(tx.amount_total_cents),
                    tx.unique_identifier
                );
            });
            let cents = i64::try_from(money::decimal_to_cents(amount))?;
            ledger
                .add(NewTransaction::new(description, cents), date)
                .await?;
            ledger
                .events()
                .unsubscribe(EventKind::TransactionAdded, subscription);
        }
        Command::List => {
            for tx in ledger.list_active().await? {
                println!(
                    "{}  {}  {:>12}  {}",
                    tx.unique_identifier,
                    tx.transaction_date_utc.format("%Y-%m-%d"),
                    money::cents_to_currency_string(tx.amount_total_cents),
                    tx.description
                );
            }
        }
        Command::Delete { id } => {
            ledger.delete(id).await?;
            println!("deleted {id}");
        }
        Command::Total => {
            let total = ledger.total_active_cents().await?;
            println!("{}", money::cents_to_currency_string(total));
        }
        Command::Currencies => {
            for currency in rates_client.get_currencies(cancel_on_ctrl_c()).await? {
                println!("{currency}");
            }
        }
        Command::Rates { min_date, max_date } => {
            let rates = rates_client
                .get_exchange_rates(min_date, max_date, cancel_on_ctrl_c())
                .await?;
            for rate in rates {
                println!(
                    "{}  {}  {}",
                    rate.record_date, rate.exchange_rate, rate.currency
                );
            }
        }
        Command::Convert {
            id,
            currency,
            min_date,
            max_date,
        } => {
            let tx = ledger.get_by_identifier(id, false).await?;
            let rates = rates_client
                .get_exchange_rates(min_date, max_date, cancel_on_ctrl_c())
                .await?;
            let rate = rates
                .iter()
                .filter(|rate| rate.currency.eq_ignore_ascii_case(&currency))
                .max_by_key(|rate| rate.record_date)
                .ok_or_else(|| format!("no rate published for {currency} in range"))?;
            println!(
                "{} = {} {} (rate {} on {})",
                money::cents_to_currency_string(tx.amount_total_cents),
                money::convert_cents(tx.amount_total_cents, rate.exchange_rate),
                rate.currency,
                rate.exchange_rate,
                rate.record_date
            );
        }
    }

    Ok(())
}

/// Cancellation signal wired to Ctrl-C for the network commands.
fn cancel_on_ctrl_c() -> watch::Receiver<bool> {
    let (cancel_tx, cancel) = rates::cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });
    cancel
}
