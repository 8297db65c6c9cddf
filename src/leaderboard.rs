//! Leaderboard ranking across stations.
//!
//! [`rank`] picks the leader(s) for one quantity in one direction and formats
//! them for display. [`Leaderboard::compute`] runs it for every component and
//! each of the three panels (minimum of period, current, maximum of period).

use serde::Serialize;
use std::cmp::Ordering;

use crate::components::Component;
use crate::parser::LastData;
use crate::stations::StationSnapshot;

/// Text shown when no station reported a value.
pub const NO_DATA: &str = "No data";

/// A station's value for one quantity, as fed to [`rank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationReading<'a> {
    pub station: &'a str,
    pub value: f64,
}

impl<'a> StationReading<'a> {
    pub fn new(station: &'a str, value: f64) -> Self {
        Self { station, value }
    }
}

/// Which end of the range wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value wins.
    Ascending,
    /// Largest value wins.
    Descending,
}

/// How a tie between three or more stations is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieStyle {
    /// `3-way tie`
    #[default]
    Plain,
    /// `3-way tie (7.0mph)`
    WithValue,
}

/// One column of the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Min,
    Current,
    Max,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Min, Panel::Current, Panel::Max];

    pub fn as_str(self) -> &'static str {
        match self {
            Panel::Min => "min",
            Panel::Current => "current",
            Panel::Max => "max",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Panel::Min => Direction::Ascending,
            Panel::Current | Panel::Max => Direction::Descending,
        }
    }

    /// The value of `component` this panel ranks for one station.
    pub fn value_of(self, component: &Component, data: &LastData) -> Option<f64> {
        let quantity = component.quantity;
        match self {
            Panel::Min if component.min_uses_high => data.high(quantity),
            Panel::Min => data.low(quantity),
            Panel::Current => data.current(quantity),
            Panel::Max => data.high(quantity),
        }
    }
}

/// Formats `value` with `decimals` places, rounding half away from zero.
///
/// Rounding applies to the decimal-scaled binary value, so `72.35` at one
/// place gives `72.4` while `1.005` at two places gives `1.00`.
pub fn format_value(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let scaled = value * scale;
    let rounded = if scaled.is_finite() {
        scaled.round() / scale
    } else {
        value
    };
    // Avoid printing "-0.0".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.decimals$}")
}

/// Describes the leader(s) among `readings`.
///
/// Readings are stable-sorted in `direction`, so tied stations are listed in
/// input order. Every reading exactly equal to the top value is part of the
/// tie group. NaN readings are ignored.
pub fn rank(
    readings: &[StationReading<'_>],
    direction: Direction,
    unit: &str,
    decimals: usize,
    tie_style: TieStyle,
) -> String {
    let mut sorted: Vec<&StationReading<'_>> =
        readings.iter().filter(|r| !r.value.is_nan()).collect();
    if sorted.is_empty() {
        return NO_DATA.to_string();
    }

    sorted.sort_by(|a, b| {
        let ord = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
        match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });

    let top = sorted[0].value;
    let leaders: Vec<&str> = sorted
        .iter()
        .take_while(|r| r.value == top)
        .map(|r| r.station)
        .collect();
    let value = format!("{}{}", format_value(top, decimals), unit);

    match leaders.as_slice() {
        [only] => format!("{only} ({value})"),
        [a, b] => format!("{a} & {b} ({value})"),
        many => match tie_style {
            TieStyle::Plain => format!("{}-way tie", many.len()),
            TieStyle::WithValue => format!("{}-way tie ({value})", many.len()),
        },
    }
}

/// Collects the readings `panel` ranks for `component`.
///
/// Stations without data, or without the field, are left out.
pub fn readings_for<'a>(
    snapshots: &'a [StationSnapshot],
    component: &Component,
    panel: Panel,
) -> Vec<StationReading<'a>> {
    snapshots
        .iter()
        .filter_map(|s| {
            let data = s.data.as_ref()?;
            let value = panel.value_of(component, data)?;
            Some(StationReading::new(&s.station.name, value))
        })
        .collect()
}

/// Leaders of the three panels for one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentLeaders {
    pub name: &'static str,
    pub key: &'static str,
    pub min: String,
    pub current: String,
    pub max: String,
}

impl ComponentLeaders {
    pub fn leader(&self, panel: Panel) -> &str {
        match panel {
            Panel::Min => &self.min,
            Panel::Current => &self.current,
            Panel::Max => &self.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub rows: Vec<ComponentLeaders>,
}

impl Leaderboard {
    pub fn compute(
        snapshots: &[StationSnapshot],
        components: &[Component],
        tie_style: TieStyle,
    ) -> Self {
        let rows = components
            .iter()
            .map(|component| {
                let leader = |panel: Panel| {
                    rank(
                        &readings_for(snapshots, component, panel),
                        panel.direction(),
                        component.unit,
                        component.decimals,
                        tie_style,
                    )
                };
                ComponentLeaders {
                    name: component.name,
                    key: component.key(),
                    min: leader(Panel::Min),
                    current: leader(Panel::Current),
                    max: leader(Panel::Max),
                }
            })
            .collect();

        Leaderboard { rows }
    }
}
