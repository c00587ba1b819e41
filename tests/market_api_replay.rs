use coindash::market::coingecko::CoinGecko;
use coindash::market::{MarketData, MarketOrder};
use coindash::trend::{CoinRef, DailyTrendSeries};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).expect("coingecko fixture must be valid JSON")
}

#[tokio::test]
async fn simple_price_fixture_parses_like_real_response() {
    let server = MockServer::start().await;
    let body = fixture(include_str!(
        "fixtures/coingecko/simple_price_btc_eth_usd.json"
    ));

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .and(query_param("ids", "bitcoin,ethereum"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = CoinGecko::with_base_url(format!("{}/api/v3", server.uri()));
    let ids = vec!["bitcoin".to_string(), "ethereum".to_string()];
    let quotes = client
        .get_price(&ids, "usd")
        .await
        .expect("fixture payload should parse");

    assert_eq!(quotes[0].price, Some(67187.0));
    assert_eq!(quotes[1].price, Some(3512.42));
}

#[tokio::test]
async fn market_chart_fixture_buckets_into_daily_means() {
    let server = MockServer::start().await;
    let body = fixture(include_str!(
        "fixtures/coingecko/market_chart_bitcoin_usd_3d.json"
    ));

    Mock::given(method("GET"))
        .and(path("/api/v3/coins/bitcoin/market_chart"))
        .and(query_param("vs_currency", "usd"))
        .and(query_param("days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = CoinGecko::with_base_url(format!("{}/api/v3", server.uri()));
    let points = client
        .get_market_chart("bitcoin", "usd", 3)
        .await
        .expect("fixture payload should parse");
    assert_eq!(points.len(), 5);

    let series = DailyTrendSeries::from_points(&CoinRef::new("bitcoin", "Bitcoin"), &points)
        .expect("samples present");
    let means: Vec<(String, f64)> = series
        .days
        .iter()
        .map(|d| (d.date.to_string(), d.price))
        .collect();

    assert_eq!(
        means,
        vec![
            ("2023-11-14".to_string(), 36500.0),
            ("2023-11-15".to_string(), 37000.0),
            ("2023-11-16".to_string(), 38000.0),
        ]
    );
}

#[tokio::test]
async fn coins_markets_fixture_ignores_extra_fields() {
    let server = MockServer::start().await;
    let body = fixture(include_str!("fixtures/coingecko/coins_markets_usd.json"));

    Mock::given(method("GET"))
        .and(path("/api/v3/coins/markets"))
        .and(query_param("order", "market_cap_desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = CoinGecko::with_base_url(format!("{}/api/v3", server.uri()));
    let markets = client
        .get_coins_markets("usd", MarketOrder::MarketCapDesc, 50, 1)
        .await
        .expect("fixture payload should parse");

    assert_eq!(markets.len(), 3);
    assert_eq!(markets[0].name, "Bitcoin");
    assert_eq!(markets[1].symbol, "eth");
    assert_eq!(markets[2].market_cap_rank, Some(3));
}

#[tokio::test]
async fn coin_detail_fixture_parses_like_real_response() {
    let server = MockServer::start().await;
    let body = fixture(include_str!("fixtures/coingecko/coin_bitcoin.json"));

    Mock::given(method("GET"))
        .and(path("/api/v3/coins/bitcoin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = CoinGecko::with_base_url(format!("{}/api/v3", server.uri()));
    let detail = client
        .get_coin_by_id("bitcoin", "usd")
        .await
        .expect("fixture payload should parse");

    assert_eq!(detail.symbol, "btc");
    assert_eq!(detail.market_cap_rank, Some(1));
    assert_eq!(detail.current_price, Some(67187.0));
    assert_eq!(detail.market_cap, Some(1324000000000.0));
    assert_eq!(detail.total_volume, Some(28100000000.0));
}

#[tokio::test]
async fn coins_list_fixture_parses_like_real_response() {
    let server = MockServer::start().await;
    let body = fixture(include_str!("fixtures/coingecko/coins_list.json"));

    Mock::given(method("GET"))
        .and(path("/api/v3/coins/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = CoinGecko::with_base_url(format!("{}/api/v3", server.uri()));
    let coins = client
        .get_coins_list()
        .await
        .expect("fixture payload should parse");

    assert_eq!(coins.len(), 4);
    let bch = coins.iter().find(|c| c.id == "bitcoin-cash").unwrap();
    assert_eq!(bch.symbol, "bch");
}
