//! Polling cycle: fetch every station, rank, render.
//!
//! Each cycle builds a fresh [`CycleContext`]; nothing but the configuration
//! carries over from one cycle to the next.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, error, info, warn};

use crate::components::Component;
use crate::display::{MemoryDisplay, render};
use crate::leaderboard::{Leaderboard, TieStyle};
use crate::source::WeatherSource;
use crate::stations::{Station, StationConfig, StationSnapshot};

/// Shortest period [`watch`] will poll at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Settings that stay fixed across cycles.
#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub components: &'static [Component],
    pub tie_style: TieStyle,
    /// Maximum number of station fetches in flight.
    pub concurrency: usize,
}

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub started_at: DateTime<Local>,
    pub snapshots: Vec<StationSnapshot>,
    pub leaderboard: Leaderboard,
}

impl CycleContext {
    pub fn stations_reporting(&self) -> usize {
        self.snapshots.iter().filter(|s| s.data.is_some()).count()
    }
}

/// Fetches every station concurrently.
///
/// Failures are logged and turn into a snapshot without data. Snapshots are
/// returned in the order of `stations`, whatever order the fetches finish in.
pub async fn fetch_all<S>(
    source: Arc<S>,
    stations: &[Station],
    concurrency: usize,
) -> Vec<StationSnapshot>
where
    S: WeatherSource + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(stations.len());

    for station in stations {
        let source = Arc::clone(&source);
        let sem = semaphore.clone();
        let station = station.clone();

        let span = tracing::info_span!(
            "fetch_station",
            station = %station.name,
            slug = %station.slug,
        );

        let task = tokio::spawn(
            async move {
                let _permit = sem.acquire().await.ok()?;
                let fetch_start = std::time::Instant::now();
                match source.last_data(&station).await {
                    Ok(data) => {
                        let elapsed = fetch_start.elapsed();
                        if elapsed.as_secs() > 5 {
                            warn!(elapsed_secs = elapsed.as_secs(), "Station fetch was slow");
                        }
                        debug!(observed_at = ?data.observed_at(), "Station reading received");
                        Some(data)
                    }
                    Err(e) => {
                        error!(error = %format!("{e:#}"), "Station fetch failed");
                        None
                    }
                }
            }
            .instrument(span),
        );

        tasks.push(task);
    }

    let mut snapshots = Vec::with_capacity(stations.len());
    for (station, task) in stations.iter().zip(tasks) {
        let data = match task.await {
            Ok(data) => data,
            Err(e) => {
                error!(station = %station.name, error = %e, "Station fetch task aborted");
                None
            }
        };
        snapshots.push(StationSnapshot {
            station: station.clone(),
            data,
        });
    }

    snapshots
}

/// Runs one full cycle and renders it into a fresh [`MemoryDisplay`].
#[tracing::instrument(skip_all, fields(stations = config.stations().len()))]
pub async fn run_cycle<S>(
    source: Arc<S>,
    config: &StationConfig,
    options: &CycleOptions,
) -> (CycleContext, MemoryDisplay)
where
    S: WeatherSource + ?Sized + 'static,
{
    let started_at = Local::now();
    let snapshots = fetch_all(source, config.stations(), options.concurrency).await;
    let leaderboard = Leaderboard::compute(&snapshots, options.components, options.tie_style);

    let ctx = CycleContext {
        started_at,
        snapshots,
        leaderboard,
    };

    let mut display = MemoryDisplay::new();
    render(&ctx, options.components, &mut display);

    info!(
        reporting = ctx.stations_reporting(),
        total = ctx.snapshots.len(),
        "Cycle complete"
    );

    (ctx, display)
}

/// Runs a cycle immediately, then every `interval`, handing each result to
/// `on_cycle`.
///
/// Stops after `cycles` cycles (0 = run until Ctrl+C). Errors returned by
/// `on_cycle` are logged and do not stop the loop. A zero `interval` is
/// raised to [`MIN_INTERVAL`].
pub async fn watch<S, F>(
    source: Arc<S>,
    config: &StationConfig,
    options: &CycleOptions,
    interval: Duration,
    cycles: usize,
    mut on_cycle: F,
) -> Result<()>
where
    S: WeatherSource + ?Sized + 'static,
    F: FnMut(&CycleContext, &MemoryDisplay) -> Result<()>,
{
    let interval = interval.max(MIN_INTERVAL);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if cycles == 0 {
        info!(interval_secs = interval.as_secs(), "Polling until Ctrl+C");
    } else {
        info!(cycles, interval_secs = interval.as_secs(), "Starting polling");
    }

    let mut count = 0;
    loop {
        if cycles > 0 && count >= cycles {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }

        count += 1;
        let (ctx, display) = run_cycle(Arc::clone(&source), config, options).await;
        if let Err(e) = on_cycle(&ctx, &display) {
            error!(cycle = count, error = %format!("{e:#}"), "Failed to publish cycle output");
        }
    }

    info!(cycles = count, "Polling stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::COMPONENTS;
    use crate::parser::LastData;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned readings by slug; unknown slugs fail. Slow slugs finish last.
    struct FakeSource {
        readings: HashMap<String, LastData>,
        slow: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn last_data(&self, station: &Station) -> Result<LastData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.slow.contains(&station.slug) {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            self.readings
                .get(&station.slug)
                .cloned()
                .ok_or_else(|| anyhow!("no such device"))
        }
    }

    fn temp(value: f64) -> LastData {
        LastData {
            tempf: Some(value),
            ..Default::default()
        }
    }

    fn config() -> StationConfig {
        StationConfig::new(vec![
            Station::new("A", "a"),
            Station::new("B", "b"),
            Station::new("C", "c"),
        ])
        .unwrap()
    }

    fn options() -> CycleOptions {
        CycleOptions {
            components: COMPONENTS,
            tie_style: TieStyle::Plain,
            concurrency: 3,
        }
    }

    fn source(slow: &[&str]) -> Arc<FakeSource> {
        let readings = HashMap::from([("a".to_string(), temp(60.0)), ("b".to_string(), temp(75.5))]);
        Arc::new(FakeSource {
            readings,
            slow: slow.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_station_order() {
        let snapshots = fetch_all(source(&["a"]), config().stations(), 3).await;

        let names: Vec<_> = snapshots.iter().map(|s| s.station.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(snapshots[0].data, Some(temp(60.0)));
        assert!(snapshots[2].data.is_none());
    }

    #[tokio::test]
    async fn test_run_cycle_failed_station_is_excluded() {
        let (ctx, display) = run_cycle(source(&[]), &config(), &options()).await;

        assert_eq!(ctx.stations_reporting(), 2);
        assert_eq!(ctx.leaderboard.rows[0].current, "B (75.5°F)");
        assert_eq!(display.text("current-tempf-leader"), Some("B (75.5°F)"));
        assert_eq!(display.text("c-tempf"), Some("--"));
        assert_eq!(display.text("a-windgustmph"), Some("--"));
        assert!(display.text("last-updated").unwrap().starts_with("Last Updated: "));
    }

    #[tokio::test]
    async fn test_watch_runs_requested_cycles() {
        let src = source(&[]);
        let mut seen = 0;
        watch(
            Arc::clone(&src),
            &config(),
            &options(),
            Duration::from_millis(5),
            2,
            |ctx, _| {
                seen += 1;
                assert_eq!(ctx.snapshots.len(), 3);
                Err(anyhow!("sink failure is not fatal"))
            },
        )
        .await
        .unwrap();

        assert_eq!(seen, 2);
        assert_eq!(src.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_watch_zero_interval_is_clamped() {
        let mut seen = 0;
        watch(source(&[]), &config(), &options(), Duration::ZERO, 3, |_, _| {
            seen += 1;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(seen, 3);
    }
}
