//! Measured quantities tracked on the leaderboard.

/// One weather metric reported in a station's `lastData` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    Temperature,
    WindSpeed,
    WindGust,
    HourlyRain,
    DailyRain,
    EventRain,
    Pressure,
}

impl Quantity {
    /// Field name used by the feed, both in `lastData` and in its `hl` map.
    pub fn key(self) -> &'static str {
        match self {
            Quantity::Temperature => "tempf",
            Quantity::WindSpeed => "windspeedmph",
            Quantity::WindGust => "windgustmph",
            Quantity::HourlyRain => "hourlyrainin",
            Quantity::DailyRain => "dailyrainin",
            Quantity::EventRain => "eventrainin",
            Quantity::Pressure => "baromrelin",
        }
    }
}

/// Display definition for a tracked quantity.
#[derive(Debug, Clone, Copy)]
pub struct Component {
    pub name: &'static str,
    pub quantity: Quantity,
    pub unit: &'static str,
    pub decimals: usize,
    /// Rank the "minimum" panel on the high-of-period value. The low end of the
    /// range is always zero for wind and accumulated rain.
    pub min_uses_high: bool,
}

impl Component {
    pub fn key(&self) -> &'static str {
        self.quantity.key()
    }
}

/// Components shown on the board, in display order.
pub static COMPONENTS: &[Component] = &[
    Component {
        name: "Temperature",
        quantity: Quantity::Temperature,
        unit: "°F",
        decimals: 1,
        min_uses_high: false,
    },
    Component {
        name: "Wind Speed",
        quantity: Quantity::WindSpeed,
        unit: "mph",
        decimals: 1,
        min_uses_high: true,
    },
    Component {
        name: "Wind Gust",
        quantity: Quantity::WindGust,
        unit: "mph",
        decimals: 1,
        min_uses_high: true,
    },
    Component {
        name: "Hourly Rain",
        quantity: Quantity::HourlyRain,
        unit: "in/hr",
        decimals: 2,
        min_uses_high: false,
    },
    Component {
        name: "Daily Rain",
        quantity: Quantity::DailyRain,
        unit: "in",
        decimals: 2,
        min_uses_high: true,
    },
    Component {
        name: "Event Rain",
        quantity: Quantity::EventRain,
        unit: "in",
        decimals: 2,
        min_uses_high: true,
    },
    Component {
        name: "Pressure",
        quantity: Quantity::Pressure,
        unit: "inHg",
        decimals: 2,
        min_uses_high: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_component_keys_are_unique() {
        let keys: HashSet<_> = COMPONENTS.iter().map(|c| c.key()).collect();
        assert_eq!(keys.len(), COMPONENTS.len());
    }

    #[test]
    fn test_inverted_minimum_only_for_zero_floored_quantities() {
        let inverted: Vec<_> = COMPONENTS
            .iter()
            .filter(|c| c.min_uses_high)
            .map(|c| c.quantity)
            .collect();
        assert_eq!(
            inverted,
            vec![
                Quantity::WindSpeed,
                Quantity::WindGust,
                Quantity::DailyRain,
                Quantity::EventRain
            ]
        );
    }
}
