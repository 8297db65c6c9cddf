use anyhow::{Result, anyhow};
use async_trait::async_trait;
use station_leaderboard::components::COMPONENTS;
use station_leaderboard::cycle::{CycleOptions, run_cycle};
use station_leaderboard::leaderboard::TieStyle;
use station_leaderboard::output::format_board;
use station_leaderboard::parser::{LastData, parse_last_data};
use station_leaderboard::source::WeatherSource;
use station_leaderboard::stations::{Station, StationConfig};
use std::sync::Arc;

/// Serves the JSON fixtures by slug; `offline` fails like a dead endpoint.
struct FixtureSource;

#[async_trait]
impl WeatherSource for FixtureSource {
    async fn last_data(&self, station: &Station) -> Result<LastData> {
        let bytes: &[u8] = match station.slug.as_str() {
            "philippe" => include_bytes!("fixtures/philippe.json"),
            "ken" => include_bytes!("fixtures/ken.json"),
            "brian" => include_bytes!("fixtures/brian.json"),
            "garbage" => b"<html>Bad Gateway</html>",
            _ => return Err(anyhow!("connection refused")),
        };
        parse_last_data(bytes)
    }
}

fn config(extra: &[(&str, &str)]) -> StationConfig {
    let mut stations = vec![
        Station::new("Philippe", "philippe"),
        Station::new("Ken", "ken"),
        Station::new("Brian", "brian"),
    ];
    stations.extend(extra.iter().map(|(name, slug)| Station::new(name, slug)));
    StationConfig::new(stations).expect("valid config")
}

fn options(tie_style: TieStyle) -> CycleOptions {
    CycleOptions {
        components: COMPONENTS,
        tie_style,
        concurrency: 2,
    }
}

#[tokio::test]
async fn test_full_pipeline() {
    let (ctx, display) = run_cycle(Arc::new(FixtureSource), &config(&[]), &options(TieStyle::Plain)).await;

    assert_eq!(ctx.stations_reporting(), 3);

    // Per-station values
    assert_eq!(display.text("philippe-tempf"), Some("71.6"));
    assert_eq!(display.text("brian-tempf"), Some("70.0"));
    assert_eq!(display.text("brian-windspeedmph"), Some("--"));
    assert_eq!(display.text("ken-dailyrainin"), Some("0.30"));
    assert_eq!(display.transform("arrow-philippe"), Some("rotate(225, 50, 50)"));

    // Temperature
    assert_eq!(display.text("min-tempf-leader"), Some("Brian (54.4°F)"));
    assert_eq!(display.text("current-tempf-leader"), Some("Ken (73.1°F)"));
    assert_eq!(display.text("max-tempf-leader"), Some("3-way tie"));

    // Wind: the minimum panel ranks the lowest high of the period
    assert_eq!(display.text("min-windspeedmph-leader"), Some("Ken (9.8mph)"));
    assert_eq!(display.text("current-windspeedmph-leader"), Some("Philippe (4.3mph)"));
    assert_eq!(display.text("min-windgustmph-leader"), Some("Brian (12.4mph)"));
    assert_eq!(display.text("current-windgustmph-leader"), Some("3-way tie"));
    assert_eq!(display.text("max-windgustmph-leader"), Some("Philippe (19.7mph)"));

    // Rain
    assert_eq!(display.text("min-hourlyrainin-leader"), Some("3-way tie"));
    assert_eq!(display.text("max-hourlyrainin-leader"), Some("Ken (0.10in/hr)"));
    assert_eq!(display.text("min-dailyrainin-leader"), Some("Philippe (0.12in)"));
    assert_eq!(display.text("current-eventrainin-leader"), Some("Ken (0.45in)"));

    // Pressure
    assert_eq!(
        display.text("current-baromrelin-leader"),
        Some("Philippe & Ken (29.92inHg)")
    );
    assert_eq!(display.text("max-baromrelin-leader"), Some("Brian (30.02inHg)"));

    let board = format_board(&ctx, &display, COMPONENTS);
    assert!(board.contains("Philippe & Ken (29.92inHg)"));
}

#[tokio::test]
async fn test_tie_with_value_style() {
    let (_, display) = run_cycle(
        Arc::new(FixtureSource),
        &config(&[]),
        &options(TieStyle::WithValue),
    )
    .await;

    assert_eq!(display.text("max-tempf-leader"), Some("3-way tie (78.4°F)"));
    assert_eq!(display.text("current-hourlyrainin-leader"), Some("3-way tie (0.00in/hr)"));
}

#[tokio::test]
async fn test_failing_stations_do_not_affect_others() {
    let cfg = config(&[("Offline", "offline"), ("Broken", "garbage")]);
    let (ctx, display) = run_cycle(Arc::new(FixtureSource), &cfg, &options(TieStyle::Plain)).await;

    assert_eq!(ctx.snapshots.len(), 5);
    assert_eq!(ctx.stations_reporting(), 3);
    assert_eq!(display.text("offline-tempf"), Some("--"));
    assert_eq!(display.text("broken-baromrelin"), Some("--"));
    assert!(display.transform("arrow-offline").is_none());
    assert_eq!(display.text("current-tempf-leader"), Some("Ken (73.1°F)"));
}
