use ratatui::style::Color;

/// One of the six fixed expenditure ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    PaleYellow,
    LightOrange,
    Orange,
    RedOrange,
    DarkRed,
    DarkestRed,
}

impl Bucket {
    pub const fn hex(self) -> u32 {
        match self {
            Bucket::PaleYellow => 0xFFEDA0,
            Bucket::LightOrange => 0xFD8D3C,
            Bucket::Orange => 0xFC4E2A,
            Bucket::RedOrange => 0xE31A1C,
            Bucket::DarkRed => 0xBD0026,
            Bucket::DarkestRed => 0x800026,
        }
    }

    pub fn color(self) -> Color {
        rgb(self.hex())
    }
}

/// Fill for countries without a value for the selected year
pub const NO_DATA_HEX: u32 = 0xCCCCCC;

pub fn no_data_color() -> Color {
    rgb(NO_DATA_HEX)
}

fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Exclusive lower bounds, highest first. Legend and styling both read this.
const THRESHOLDS: [(f64, Bucket); 5] = [
    (100_000_000_000.0, Bucket::DarkestRed),
    (50_000_000_000.0, Bucket::DarkRed),
    (20_000_000_000.0, Bucket::RedOrange),
    (10_000_000_000.0, Bucket::Orange),
    (5_000_000_000.0, Bucket::LightOrange),
];

/// Bucket for a non-negative expenditure. A value equal to a threshold
/// belongs to the bucket below it.
pub fn color_for(value: f64) -> Bucket {
    THRESHOLDS
        .iter()
        .find(|&&(threshold, _)| value > threshold)
        .map(|&(_, bucket)| bucket)
        .unwrap_or(Bucket::PaleYellow)
}

/// A legend row: the bucket and the range it covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub bucket: Bucket,
    /// Exclusive lower bound, `None` for the lowest bucket
    pub above: Option<f64>,
    /// Inclusive upper bound, `None` for the highest bucket
    pub up_to: Option<f64>,
}

impl LegendEntry {
    pub fn label(&self) -> String {
        match (self.above, self.up_to) {
            (Some(lo), Some(hi)) => format!("{}–{}", compact_amount(lo), compact_amount(hi)),
            (Some(lo), None) => format!("> {}", compact_amount(lo)),
            (None, Some(hi)) => format!("≤ {}", compact_amount(hi)),
            (None, None) => String::from("any"),
        }
    }
}

/// Legend rows, lowest bucket first
pub fn legend() -> Vec<LegendEntry> {
    let bounds: Vec<(f64, Bucket)> = THRESHOLDS.iter().rev().copied().collect();

    let mut entries = Vec::with_capacity(bounds.len() + 1);
    entries.push(LegendEntry {
        bucket: Bucket::PaleYellow,
        above: None,
        up_to: bounds.first().map(|&(t, _)| t),
    });
    for (i, &(threshold, bucket)) in bounds.iter().enumerate() {
        entries.push(LegendEntry {
            bucket,
            above: Some(threshold),
            up_to: bounds.get(i + 1).map(|&(t, _)| t),
        });
    }
    entries
}

/// `5_000_000_000.0` → `"5B"`
fn compact_amount(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    for (scale, suffix) in UNITS {
        if value.abs() >= scale {
            let scaled = value / scale;
            return if scaled.fract() == 0.0 {
                format!("{scaled:.0}{suffix}")
            } else {
                format!("{scaled:.1}{suffix}")
            };
        }
    }
    format!("{value}")
}
