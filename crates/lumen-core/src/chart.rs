//! Chart series projection for the history panel.
//!
//! A derived, disposable projection of history samples: two aligned numeric
//! series plus time labels. Rebuilt wholesale when the selected date changes
//! and appended to on live polls, under two guards: the chart must be showing
//! today, and it must already be anchored by a non-empty historical load. An
//! unanchored chart never fabricates a series from live polls alone.

use time::{Date, OffsetDateTime};

use lumen_types::HistorySample;

/// Labels and series for the sensor/brightness chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    date: Option<Date>,
    labels: Vec<String>,
    sensor: Vec<u32>,
    brightness: Vec<u8>,
}

/// Render an `HH:MM` label for a sample or poll timestamp.
fn time_label(at: OffsetDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

impl ChartSeries {
    /// An empty, unanchored series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the series from a historical load.
    ///
    /// An empty `samples` slice is a valid outcome: the chart clears rather
    /// than keeping stale data, and stays unanchored.
    pub fn rebuild(&mut self, date: Date, samples: &[HistorySample]) {
        self.date = Some(date);
        self.labels = samples.iter().map(|s| time_label(s.timestamp)).collect();
        self.sensor = samples.iter().map(|s| s.sensor_value).collect();
        self.brightness = samples.iter().map(|s| s.brightness).collect();
    }

    /// Append one live point if the chart is showing `today` and a
    /// historical load has anchored it. Returns whether a point was added.
    pub fn live_append(
        &mut self,
        today: Date,
        at: OffsetDateTime,
        sensor_value: u32,
        brightness: u8,
    ) -> bool {
        if self.date != Some(today) || self.is_empty() {
            return false;
        }
        self.labels.push(time_label(at));
        self.sensor.push(sensor_value);
        self.brightness.push(brightness);
        true
    }

    /// The date this series was loaded for.
    pub fn date(&self) -> Option<Date> {
        self.date
    }

    /// Whether the series holds no points.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of points in the series.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Time labels, one per point.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Sensor readings, aligned with labels.
    pub fn sensor(&self) -> &[u32] {
        &self.sensor
    }

    /// Brightness values, aligned with labels.
    pub fn brightness(&self) -> &[u8] {
        &self.brightness
    }
}
