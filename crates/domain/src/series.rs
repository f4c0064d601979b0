//! Chart series: per-sensor, append-only lines of measurements.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::id::{LIGHT_SENSOR, MOVEMENT_SENSOR, NOISE_SENSOR, SourceId};
use crate::measurement::Measurement;

/// RGBA display color of a chart line.
///
/// Serialized as a `#RRGGBBAA` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl SeriesColor {
    const HALF_ALPHA: u8 = 0x80;

    pub const CYAN: Self = Self::rgba(0x00, 0xFF, 0xFF, Self::HALF_ALPHA);
    pub const YELLOW: Self = Self::rgba(0xFF, 0xFF, 0x00, Self::HALF_ALPHA);
    pub const MAGENTA: Self = Self::rgba(0xFF, 0x00, 0xFF, Self::HALF_ALPHA);
    pub const BLACK: Self = Self::rgba(0x00, 0x00, 0x00, 0xFF);

    #[must_use]
    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Deterministic color for a sensor; unknown sensors are drawn in black.
    #[must_use]
    pub fn for_source(id: &SourceId) -> Self {
        match id.as_str() {
            NOISE_SENSOR => Self::CYAN,
            LIGHT_SENSOR => Self::YELLOW,
            MOVEMENT_SENSOR => Self::MAGENTA,
            _ => Self::BLACK,
        }
    }

    fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#')?;
        if hex.len() != 8 || !hex.is_ascii() {
            return None;
        }
        let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?))
    }
}

impl fmt::Display for SeriesColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02X}{:02X}{:02X}{:02X}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl Serialize for SeriesColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeriesColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_hex(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{raw}`")))
    }
}

/// One chart line: a fixed color and the measurements received so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub color: SeriesColor,
    pub data: Vec<Measurement>,
}

impl ChartSeries {
    #[must_use]
    pub fn new(color: SeriesColor) -> Self {
        Self {
            color,
            data: Vec::new(),
        }
    }
}

/// Combined measurements of every sensor that has ever been enabled.
///
/// Entries are never removed: disabling a sensor freezes its line but keeps
/// the history on the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedSeries(BTreeMap<SourceId, ChartSeries>);

impl CombinedSeries {
    /// Return the series for `id`, creating it with its color on first use.
    pub fn ensure(&mut self, id: &SourceId) -> &mut ChartSeries {
        self.0
            .entry(id.clone())
            .or_insert_with(|| ChartSeries::new(SeriesColor::for_source(id)))
    }

    /// Append one measurement to the line of `id`.
    pub fn append(&mut self, id: &SourceId, measurement: Measurement) {
        self.ensure(id).data.push(measurement);
    }

    #[must_use]
    pub fn get(&self, id: &SourceId) -> Option<&ChartSeries> {
        self.0.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &SourceId) -> bool {
        self.0.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, &ChartSeries)> {
        self.0.iter()
    }
}
