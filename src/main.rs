use clap::{Parser, Subcommand};
use coindash::error::Result;
use coindash::leaderboard::{DEFAULT_LEADERBOARD_SIZE, MAX_LEADERBOARD_SIZE};
use coindash::market::coingecko::CoinGecko;
use coindash::market::memo::ReferenceCache;
use coindash::market::{MarketData, MarketOrder, display_name_for};
use coindash::output::{json, table};
use coindash::{compare, config, forecast, leaderboard, portfolio, search};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const APP_VERSION: &str = env!("COINDASH_VERSION");

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OrderArg {
    MarketCapDesc,
    MarketCapAsc,
    VolumeDesc,
    VolumeAsc,
    IdAsc,
    IdDesc,
}

impl From<OrderArg> for MarketOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::MarketCapDesc => Self::MarketCapDesc,
            OrderArg::MarketCapAsc => Self::MarketCapAsc,
            OrderArg::VolumeDesc => Self::VolumeDesc,
            OrderArg::VolumeAsc => Self::VolumeAsc,
            OrderArg::IdAsc => Self::IdAsc,
            OrderArg::IdDesc => Self::IdDesc,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "coindash",
    version = APP_VERSION,
    about = "Crypto portfolio, trends, and market views in your terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Fiat currency for prices
    #[arg(long, short, global = true)]
    currency: Option<String>,

    /// Lookback window in days for trend views
    #[arg(
        long,
        global = true,
        value_parser = clap::value_parser!(u32).range(1..=config::MAX_LOOKBACK_DAYS as i64)
    )]
    days: Option<u32>,

    /// CoinGecko demo API key
    #[arg(long, env = "COINGECKO_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Override the CoinGecko API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Explicit config file path (overrides XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Value your holdings and chart daily trends for the coins you hold
    Portfolio {
        /// Amount held, e.g. --hold bitcoin=0.5 (repeatable)
        #[arg(
            long = "hold",
            value_name = "COIN=AMOUNT",
            value_parser = portfolio::parse_holding_arg
        )]
        holdings: Vec<(String, f64)>,
    },

    /// Compare two of the top 50 coins side by side
    Compare {
        /// First coin (id or name)
        first: String,
        /// Second coin (id or name)
        second: String,
    },

    /// Rank coins by market data
    Leaderboard {
        /// Number of coins to show
        #[arg(
            long,
            default_value_t = DEFAULT_LEADERBOARD_SIZE,
            value_parser = clap::value_parser!(u32).range(1..=MAX_LEADERBOARD_SIZE as i64)
        )]
        count: u32,

        /// Sort order
        #[arg(long, value_enum, default_value_t = OrderArg::MarketCapDesc)]
        order: OrderArg,
    },

    /// Look up any listed coin by name, id, or symbol
    Search {
        /// Coin name, e.g. "bitcoin cash"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Project the price trend forward with a linear fit
    Predict {
        /// CoinGecko coin id
        #[arg(default_value = "bitcoin")]
        coin: String,

        /// Days to extrapolate past the lookback window
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=forecast::MAX_HORIZON_DAYS as i64)
        )]
        horizon: Option<u32>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(cli: &Cli, app_config: &config::AppConfig) -> CoinGecko {
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| app_config.coingecko.base_url.clone());
    let client = match base_url {
        Some(url) => CoinGecko::with_base_url(url),
        None => CoinGecko::new(),
    };

    match cli
        .api_key
        .clone()
        .or_else(|| app_config.coingecko.api_key.clone())
    {
        Some(key) => client.with_api_key(key),
        None => client,
    }
}

fn warn_unquoted(ids: &[&str]) {
    if !ids.is_empty() {
        eprintln!(
            "{} no price returned for {}; valued at 0",
            "warning:".yellow().bold(),
            ids.join(", ")
        );
    }
}

#[tokio::main]
async fn main() {
    // Load .env before CLI parsing so env-backed args (e.g. COINGECKO_API_KEY) pick it up.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!(error = %e, "fatal error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app_config = match cli.config.as_deref() {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    let client = build_client(&cli, &app_config);
    info!(provider = client.name(), "market data client ready");
    let reference = ReferenceCache::new(app_config.coingecko.reference_ttl_secs);

    let currency = cli
        .currency
        .clone()
        .or_else(|| app_config.defaults.currency.clone())
        .unwrap_or_else(|| config::DEFAULT_CURRENCY.to_string())
        .to_lowercase();
    let days = cli.days.unwrap_or_else(|| app_config.lookback_days());
    let trend_title = format!("{days}-Day Price Trends (Daily Average)");

    match cli.command {
        Command::Portfolio { holdings } => {
            let holdings = portfolio::resolve_holdings(&app_config.holdings, &holdings)?;
            info!(coins = holdings.len(), currency = %currency, days, "analyzing portfolio");

            let report = portfolio::analyze_portfolio(&client, &holdings, &currency, days).await;
            table::print_failures(report.price_failure.as_slice());
            if report.price_failure.is_none() {
                warn_unquoted(&report.valuation.unquoted());
            }
            table::print_failures(&report.trends.failures);

            if cli.json {
                return json::print_json(&report);
            }

            table::print_valuation(&report.valuation, &currency);
            table::print_allocation(&report.valuation.distribution(), &currency);
            table::print_trends(
                &report.trends.table,
                &trend_title,
                &currency,
                "No trend data available. Enter non-zero holdings for at least one cryptocurrency.",
            );
        }

        Command::Compare { first, second } => {
            let comparison =
                compare::compare_coins(&client, &reference, &first, &second, &currency, days)
                    .await?;
            table::print_failures(&comparison.trends.failures);

            if cli.json {
                return json::print_json(&comparison);
            }

            table::print_coin_stats(&[&comparison.first, &comparison.second], &currency);
            table::print_trends(
                &comparison.trends.table,
                &format!("{days}-Day Price Trend Comparison"),
                &currency,
                "No price data available for either coin.",
            );
        }

        Command::Leaderboard { count, order } => {
            let rows =
                leaderboard::fetch_leaderboard(&client, &currency, order.into(), count).await?;

            if cli.json {
                return json::print_json(&rows);
            }

            table::print_leaderboard(&rows, &currency);
        }

        Command::Search { query } => {
            let query = query.join(" ");
            let outcome = search::search_coin(&client, &reference, &query, &currency, days).await?;
            table::print_failures(outcome.detail_failure.as_slice());
            table::print_failures(&outcome.trends.failures);

            if cli.json {
                return json::print_json(&outcome);
            }

            let coin = &outcome.coin;
            println!("{} ({})", coin.name.bold(), coin.id.dimmed());
            match &outcome.stats {
                Some(stats) if !stats.lacks_market_data() => {
                    table::print_coin_stats(&[stats], &currency)
                }
                Some(_) => println!("{}", "No market data available.".yellow()),
                None => {}
            }
            table::print_trends(
                &outcome.trends.table,
                &format!("{} Price Over Last {days} Days", outcome.coin.name),
                &currency,
                "No price data available.",
            );
        }

        Command::Predict { coin, horizon } => {
            let coin = coin.trim().to_lowercase();
            let horizon = match horizon {
                Some(days) => days as usize,
                None => app_config.horizon_days(),
            };
            let projection =
                forecast::predict_coin(&client, &coin, &currency, days, horizon).await?;

            if cli.json {
                return json::print_json(&projection);
            }

            table::print_projection(&display_name_for(&coin), &projection, &currency);
        }
    }

    Ok(())
}
