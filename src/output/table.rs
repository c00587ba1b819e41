use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::compare::CoinStats;
use crate::error::FetchFailure;
use crate::forecast::Projection;
use crate::leaderboard::LeaderboardRow;
use crate::output::chart;
use crate::portfolio::{AllocationSlice, Valuation};
use crate::trend::TrendTable;

const CHART_WIDTH: u16 = 96;
const CHART_HEIGHT: u16 = 18;

#[derive(Tabled)]
struct ValuationLine {
    #[tabled(rename = "Cryptocurrency")]
    name: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print the holdings valuation with its total above it.
pub fn print_valuation(valuation: &Valuation, currency: &str) {
    println!(
        "{} {}",
        "Total Portfolio Value:".bold(),
        format_price(valuation.total, currency).bold()
    );

    let rows: Vec<ValuationLine> = valuation
        .rows
        .iter()
        .map(|r| ValuationLine {
            name: r.name.clone(),
            amount: format_amount(r.amount),
            price: if r.quoted {
                format_price(r.price, currency)
            } else {
                format!("{} (no quote)", format_price(0.0, currency))
                    .dimmed()
                    .to_string()
            },
            value: format_price(r.value, currency),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct AllocationLine {
    #[tabled(rename = "Cryptocurrency")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Share")]
    share: String,
}

/// Print the portfolio distribution as a share table and a bar chart.
pub fn print_allocation(slices: &[AllocationSlice], currency: &str) {
    if slices.is_empty() {
        println!("{}", "No holdings with a positive value to chart.".dimmed());
        return;
    }

    let rows: Vec<AllocationLine> = slices
        .iter()
        .map(|s| AllocationLine {
            name: s.name.clone(),
            value: format_price(s.value, currency),
            share: format!("{:.1}%", s.share * 100.0),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    println!(
        "{}",
        chart::render_allocation_bars(slices, "Portfolio Distribution", CHART_WIDTH, CHART_HEIGHT)
    );
}

/// Print the daily trend table and its chart, or the no-data notice.
pub fn print_trends(table: &TrendTable, title: &str, currency: &str, empty_notice: &str) {
    if table.is_empty() {
        println!("{}", empty_notice.yellow());
        return;
    }

    let mut builder = Builder::default();
    let mut header = vec!["Date".to_string()];
    header.extend(table.columns.iter().cloned());
    builder.push_record(header);

    for row in &table.rows {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
        record.extend(row.values.iter().map(|v| match v {
            Some(price) => format_price(*price, currency),
            None => "-".to_string(),
        }));
        builder.push_record(record);
    }

    println!("{}", builder.build().with(Style::rounded()));
    println!(
        "{}",
        chart::render_trend_chart(table, title, currency, CHART_WIDTH, CHART_HEIGHT)
    );
}

#[derive(Tabled)]
struct LeaderboardLine {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Market Cap")]
    market_cap: String,
    #[tabled(rename = "24h Volume")]
    volume: String,
}

/// Print the market leaderboard.
pub fn print_leaderboard(rows: &[LeaderboardRow], currency: &str) {
    let lines: Vec<LeaderboardLine> = rows
        .iter()
        .map(|r| LeaderboardLine {
            rank: r.rank,
            name: r.name.clone(),
            symbol: r.symbol.clone().bold().to_string(),
            price: optional(r.price.map(|p| format_price(p, currency))),
            market_cap: optional(r.market_cap.map(|c| format_market_cap(c, currency))),
            volume: optional(r.volume_24h.map(|v| format_market_cap(v, currency))),
        })
        .collect();

    println!("{}", Table::new(lines).with(Style::rounded()));
}

/// Print statistics for one or more coins side by side.
pub fn print_coin_stats(stats: &[&CoinStats], currency: &str) {
    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(stats.iter().map(|s| s.name.bold().to_string()));
    builder.push_record(header);

    let metric = |label: &str, f: &dyn Fn(&CoinStats) -> String| {
        let mut record = vec![label.to_string()];
        record.extend(stats.iter().map(|s| f(*s)));
        record
    };

    builder.push_record(metric("Current Price", &|s: &CoinStats| {
        optional(s.price.map(|p| format_price(p, currency)))
    }));
    builder.push_record(metric("Symbol", &|s: &CoinStats| s.symbol.clone()));
    builder.push_record(metric("Market Cap", &|s: &CoinStats| {
        optional(s.market_cap.map(|c| format_whole(c, currency)))
    }));
    builder.push_record(metric("24h Volume", &|s: &CoinStats| {
        optional(s.volume_24h.map(|v| format_whole(v, currency)))
    }));
    builder.push_record(metric("Market Rank", &|s: &CoinStats| {
        optional(s.rank.map(|r| r.to_string()))
    }));

    println!("{}", builder.build().with(Style::rounded()));
}

/// Print the projection headline values and chart.
pub fn print_projection(name: &str, projection: &Projection, currency: &str) {
    let change = projection.predicted_price - projection.current_price;
    let predicted = format_price_signed(projection.predicted_price, currency);
    let predicted = if change >= 0.0 {
        predicted.green()
    } else {
        predicted.red()
    };

    println!(
        "Current Price: {}    Predicted Price (end of horizon): {}",
        format_price_signed(projection.current_price, currency).bold(),
        predicted.bold()
    );
    println!(
        "Trend: {} per sample over {} samples",
        format_price_signed(projection.model.slope, currency),
        projection.fitted.len()
    );
    println!(
        "{}",
        chart::render_projection_chart(
            projection,
            &format!("{name} Price Trend"),
            currency,
            CHART_WIDTH,
            CHART_HEIGHT
        )
    );
    println!(
        "{}",
        "Linear regression over the lookback window; not financial advice.".dimmed()
    );
}

/// Print isolated fetch failures as warnings on stderr.
pub fn print_failures(failures: &[FetchFailure]) {
    for failure in failures {
        eprintln!("{} {}", "warning:".yellow().bold(), failure);
    }
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "N/A".dimmed().to_string())
}

fn format_amount(amount: f64) -> String {
    if amount == 0.0 {
        "0".to_string()
    } else if amount >= 1.0 {
        format_with_commas(amount, 4)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        format!("{amount:.8}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn format_price(price: f64, currency: &str) -> String {
    let sym = currency_symbol(currency);
    if price == 0.0 || price >= 1.0 {
        format!("{}{}", sym, format_with_commas(price, 2))
    } else if price >= 0.01 {
        format!("{}{:.4}", sym, price)
    } else {
        format!("{}{:.8}", sym, price)
    }
}

/// Like [`format_price`] but keeps the sign of negative extrapolations.
fn format_price_signed(price: f64, currency: &str) -> String {
    if price < 0.0 {
        format!("-{}", format_price(-price, currency))
    } else {
        format_price(price, currency)
    }
}

fn format_with_commas(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (whole, fraction) = match formatted.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (formatted.as_str(), None),
    };
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole),
    };

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

fn format_whole(value: f64, currency: &str) -> String {
    let symbol = currency_symbol(currency);
    format!("{symbol}{}", format_with_commas(value, 0))
}

fn format_market_cap(cap: f64, currency: &str) -> String {
    let sym = currency_symbol(currency);
    if cap >= 1_000_000_000_000.0 {
        format!("{}{:.2}T", sym, cap / 1_000_000_000_000.0)
    } else if cap >= 1_000_000_000.0 {
        format!("{}{:.2}B", sym, cap / 1_000_000_000.0)
    } else if cap >= 1_000_000.0 {
        format!("{}{:.2}M", sym, cap / 1_000_000.0)
    } else if cap >= 1_000.0 {
        format!("{}{:.2}K", sym, cap / 1_000.0)
    } else {
        format!("{}{:.2}", sym, cap)
    }
}

fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{00a3}",
        "JPY" | "CNY" => "\u{00a5}",
        "CAD" => "CA$",
        "AUD" => "A$",
        "CHF" => "CHF ",
        "BTC" => "\u{20bf}",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas_group_thousands() {
        assert_eq!(format_with_commas(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_with_commas(999.0, 0), "999");
        assert_eq!(format_with_commas(-1500.5, 1), "-1,500.5");
    }

    #[test]
    fn prices_scale_precision() {
        assert_eq!(format_price(100_000.0, "usd"), "$100,000.00");
        assert_eq!(format_price(0.0, "usd"), "$0.00");
        assert_eq!(format_price(0.05, "usd"), "$0.0500");
        assert_eq!(format_price(0.000123, "eur"), "\u{20ac}0.00012300");
        assert_eq!(format_price_signed(-12.5, "usd"), "-$12.50");
    }

    #[test]
    fn market_caps_abbreviate() {
        assert_eq!(format_market_cap(1.5e12, "usd"), "$1.50T");
        assert_eq!(format_market_cap(2.0e6, "usd"), "$2.00M");
        assert_eq!(format_market_cap(12.0, "xyz"), "12.00");
    }

    #[test]
    fn amounts_drop_trailing_zeros() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(1234.5), "1,234.5");
        assert_eq!(format_amount(0.25), "0.25");
    }
}
