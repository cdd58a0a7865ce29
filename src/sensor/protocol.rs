//! Device→host line protocol: comma-separated ASCII numbers, one reading per line.

use serde::{Deserialize, Serialize};

use super::{GAS_CHANNEL_COUNT, Reading};

/// Minimum field count for the plain layout: temperature, humidity and ten gases.
pub const MIN_PLAIN_FIELDS: usize = 2 + GAS_CHANNEL_COUNT;

/// Field layout of a device line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLayout {
    /// `temp,humid,g0..g9[,...]`, as logged by the collector.
    #[default]
    Plain,
    /// `index,temp,humid,g0..g9[,...]`, as streamed by the live-monitor firmware.
    Indexed,
}

impl LineLayout {
    /// Fields required before a line is accepted.
    pub fn min_fields(self) -> usize {
        match self {
            LineLayout::Plain => MIN_PLAIN_FIELDS,
            LineLayout::Indexed => MIN_PLAIN_FIELDS + 1,
        }
    }
}

/// Parse one device line.
///
/// Returns `None` for blank, short or non-numeric lines; extra trailing fields are ignored.
pub fn parse_line(line: &str, layout: LineLayout) -> Option<Reading> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if layout == LineLayout::Indexed && !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < layout.min_fields() {
        return None;
    }
    let mut values = fields.iter().take(layout.min_fields()).map(|f| f.trim().parse::<f64>());
    let index = match layout {
        LineLayout::Plain => None,
        LineLayout::Indexed => Some(values.next()?.ok()?),
    };
    let temperature = values.next()?.ok()?;
    let humidity = values.next()?.ok()?;
    let mut gases = [0f64; GAS_CHANNEL_COUNT];
    for gas in gases.iter_mut() {
        *gas = values.next()?.ok()?;
    }
    Some(Reading {
        index,
        temperature,
        humidity,
        gases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "24.5,51.2,1000,2000,3000,4000,5000,6000,7000,8000,9000,10000";

    #[test]
    fn parses_plain_line() {
        let reading = parse_line(PLAIN, LineLayout::Plain).unwrap();
        assert_eq!(reading.index, None);
        assert_eq!(reading.temperature, 24.5);
        assert_eq!(reading.humidity, 51.2);
        assert_eq!(reading.gases[0], 1000.0);
        assert_eq!(reading.reference(), 10000.0);
    }

    #[test]
    fn ignores_trailing_fields_and_whitespace() {
        let line = format!("  {PLAIN},extra,stuff\r\n");
        let reading = parse_line(&line, LineLayout::Plain).unwrap();
        assert_eq!(reading.gases[9], 10000.0);
    }

    #[test]
    fn rejects_short_lines() {
        for take in 0..MIN_PLAIN_FIELDS {
            let line: Vec<&str> = PLAIN.split(',').take(take).collect();
            assert!(parse_line(&line.join(","), LineLayout::Plain).is_none(), "{take} fields");
        }
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let line = PLAIN.replace("5000", "abc");
        assert!(parse_line(&line, LineLayout::Plain).is_none());
        assert!(parse_line("BME688 ready", LineLayout::Plain).is_none());
    }

    #[test]
    fn indexed_layout_reads_leading_counter() {
        let line = format!("17,{PLAIN}");
        let reading = parse_line(&line, LineLayout::Indexed).unwrap();
        assert_eq!(reading.index, Some(17.0));
        assert_eq!(reading.temperature, 24.5);
        assert_eq!(reading.gases[9], 10000.0);
        assert!(parse_line(PLAIN, LineLayout::Indexed).is_none());
        assert!(parse_line(&format!("#{PLAIN},1"), LineLayout::Indexed).is_none());
    }
}
