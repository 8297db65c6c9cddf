//! Output formatting and persistence for cycle results.
//!
//! Supports a plain-text terminal board, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::components::Component;
use crate::cycle::CycleContext;
use crate::display::{MISSING, MemoryDisplay, Slot, compass_point};
use crate::leaderboard::{Leaderboard, Panel};
use crate::parser::LastData;
use csv::WriterBuilder;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;

/// Lays out the slots of `display` as a text board: one column per station,
/// then the leaderboard.
pub fn format_board(ctx: &CycleContext, display: &MemoryDisplay, components: &[Component]) -> String {
    let mut out = String::new();
    let stations: Vec<_> = ctx.snapshots.iter().map(|s| &s.station).collect();

    let _ = write!(out, "{:<14}", "");
    for station in &stations {
        let _ = write!(out, "{:>12}", station.name);
    }
    out.push('\n');

    for component in components {
        let _ = write!(out, "{:<14}", component.name);
        for station in &stations {
            let id = Slot::StationValue {
                station: station.id(),
                key: component.key(),
            }
            .element_id();
            let text = display.text(&id).unwrap_or(MISSING);
            let _ = write!(out, "{:>12}", text);
        }
        let _ = writeln!(out, " {}", component.unit);
    }

    let _ = write!(out, "{:<14}", "Wind Dir");
    for snapshot in &ctx.snapshots {
        let dir = snapshot
            .data
            .as_ref()
            .and_then(|d| d.winddir)
            .map(|deg| format!("{} {deg}°", compass_point(deg)))
            .unwrap_or_else(|| MISSING.to_string());
        let _ = write!(out, "{:>12}", dir);
    }
    out.push_str("\n\n");

    let _ = writeln!(out, "{:<14}{:<28}{:<28}{:<28}", "Leaderboard", "Min", "Current", "Max");
    for component in components {
        let _ = write!(out, "{:<14}", component.name);
        for panel in Panel::ALL {
            let id = Slot::Leader {
                panel,
                key: component.key(),
            }
            .element_id();
            let _ = write!(out, "{:<28}", display.text(&id).unwrap_or(MISSING));
        }
        out.push('\n');
    }

    if let Some(updated) = display.text(&Slot::LastUpdated.element_id()) {
        let _ = writeln!(out, "\n{updated}");
    }

    out
}

/// Prints the text board to stdout.
pub fn print_board(ctx: &CycleContext, display: &MemoryDisplay, components: &[Component]) {
    println!("{}", format_board(ctx, display, components));
}

#[derive(Serialize)]
struct StationJson<'a> {
    name: &'a str,
    data: Option<&'a LastData>,
}

#[derive(Serialize)]
struct BoardJson<'a> {
    updated_at: DateTime<Utc>,
    stations: Vec<StationJson<'a>>,
    leaderboard: &'a Leaderboard,
}

/// Serializes a cycle as pretty-printed JSON.
pub fn board_json(ctx: &CycleContext) -> Result<String> {
    let board = BoardJson {
        updated_at: ctx.started_at.with_timezone(&Utc),
        stations: ctx
            .snapshots
            .iter()
            .map(|s| StationJson {
                name: &s.station.name,
                data: s.data.as_ref(),
            })
            .collect(),
        leaderboard: &ctx.leaderboard,
    };
    Ok(serde_json::to_string_pretty(&board)?)
}

/// Prints a cycle to stdout as pretty-printed JSON.
pub fn print_json(ctx: &CycleContext) -> Result<()> {
    println!("{}", board_json(ctx)?);
    Ok(())
}

/// One leaderboard cell, as written to CSV.
#[derive(Debug, Serialize)]
pub struct LeaderRecord<'a> {
    pub timestamp: DateTime<Utc>,
    pub component: &'a str,
    pub key: &'a str,
    pub panel: Panel,
    pub leader: &'a str,
}

/// Appends every leaderboard cell of a cycle as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, ctx: &CycleContext) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    let timestamp = ctx.started_at.with_timezone(&Utc);
    for row in &ctx.leaderboard.rows {
        for panel in Panel::ALL {
            writer.serialize(LeaderRecord {
                timestamp,
                component: row.name,
                key: row.key,
                panel,
                leader: row.leader(panel),
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}
