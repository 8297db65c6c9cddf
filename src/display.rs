//! Output slots written after each cycle.
//!
//! Every value shown on the board has a [`Slot`] with a stable element id.
//! A [`DisplaySink`] receives the text for each slot; [`MemoryDisplay`] keeps
//! them in memory so the terminal board and tests can read them back.

use std::collections::BTreeMap;

use crate::components::Component;
use crate::cycle::CycleContext;
use crate::leaderboard::{Panel, format_value};

/// Shown for a station value the feed did not report.
pub const MISSING: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Current value of one component at one station.
    StationValue { station: String, key: &'static str },
    /// Leader text for one component and panel.
    Leader { panel: Panel, key: &'static str },
    /// Wind direction indicator of one station.
    WindArrow { station: String },
    LastUpdated,
}

impl Slot {
    /// Element id, e.g. `ken-tempf`, `max-tempf-leader`, `arrow-ken`.
    pub fn element_id(&self) -> String {
        match self {
            Slot::StationValue { station, key } => format!("{station}-{key}"),
            Slot::Leader { panel, key } => format!("{}-{key}-leader", panel.as_str()),
            Slot::WindArrow { station } => format!("arrow-{station}"),
            Slot::LastUpdated => "last-updated".to_string(),
        }
    }
}

/// Receives rendered output.
pub trait DisplaySink {
    fn set_text(&mut self, slot: &Slot, text: &str);

    /// Rotates a directional indicator to `degrees` (0 = north, clockwise).
    fn set_rotation(&mut self, slot: &Slot, degrees: f64);
}

/// Keeps the latest text and rotation transform of every slot.
#[derive(Debug, Default, Clone)]
pub struct MemoryDisplay {
    texts: BTreeMap<String, String>,
    transforms: BTreeMap<String, String>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, element_id: &str) -> Option<&str> {
        self.texts.get(element_id).map(String::as_str)
    }

    pub fn transform(&self, element_id: &str) -> Option<&str> {
        self.transforms.get(element_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.texts.len() + self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DisplaySink for MemoryDisplay {
    fn set_text(&mut self, slot: &Slot, text: &str) {
        self.texts.insert(slot.element_id(), text.to_string());
    }

    fn set_rotation(&mut self, slot: &Slot, degrees: f64) {
        self.transforms
            .insert(slot.element_id(), format!("rotate({degrees}, 50, 50)"));
    }
}

/// Sixteen-point compass name for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let index = (degrees.rem_euclid(360.0) / 22.5).round() as usize % POINTS.len();
    POINTS[index]
}

/// Writes station values, wind arrows, leaders and the update time of one
/// cycle to `sink`.
///
/// Stations without data get [`MISSING`] in every value slot and leave their
/// arrow untouched.
pub fn render(ctx: &CycleContext, components: &[Component], sink: &mut dyn DisplaySink) {
    for snapshot in &ctx.snapshots {
        let station = snapshot.station.id();
        let data = snapshot.data.as_ref();

        for component in components {
            let text = data
                .and_then(|d| d.current(component.quantity))
                .map(|v| format_value(v, component.decimals))
                .unwrap_or_else(|| MISSING.to_string());
            let slot = Slot::StationValue {
                station: station.clone(),
                key: component.key(),
            };
            sink.set_text(&slot, &text);
        }

        if let Some(degrees) = data.and_then(|d| d.winddir) {
            sink.set_rotation(&Slot::WindArrow { station }, degrees);
        }
    }

    for row in &ctx.leaderboard.rows {
        for panel in Panel::ALL {
            let slot = Slot::Leader {
                panel,
                key: row.key,
            };
            sink.set_text(&slot, row.leader(panel));
        }
    }

    let updated = format!(
        "Last Updated: {}",
        ctx.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    sink.set_text(&Slot::LastUpdated, &updated);
}
