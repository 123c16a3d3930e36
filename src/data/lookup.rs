use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, info, warn};

use crate::data::names::NameAliasTable;
use crate::error::YearError;

/// A year covered by the expenditure table (1960..=2020)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(u16);

impl Year {
    pub const FIRST: Year = Year(1960);
    pub const LAST: Year = Year(2020);
    /// Year shown when data first becomes ready
    pub const DEFAULT: Year = Year::LAST;
    /// Number of years in range
    pub const SPAN: usize = (Self::LAST.0 - Self::FIRST.0) as usize + 1;

    pub fn new(value: i64) -> Result<Self, YearError> {
        if (Self::FIRST.0 as i64..=Self::LAST.0 as i64).contains(&value) {
            Ok(Year(value as u16))
        } else {
            Err(YearError::OutOfRange(value))
        }
    }

    /// Clamp into range instead of rejecting
    pub fn saturating_from(value: i64) -> Self {
        Year(value.clamp(Self::FIRST.0 as i64, Self::LAST.0 as i64) as u16)
    }

    /// Parse a table header such as `"1975"`
    pub fn from_header(header: &str) -> Option<Self> {
        header.trim().parse::<i64>().ok().and_then(|v| Self::new(v).ok())
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Move by `delta` years, stopping at the ends of the range
    pub fn offset(self, delta: i64) -> Self {
        Self::saturating_from(self.0 as i64 + delta)
    }

    /// Position within the dense per-country series
    pub fn index(self) -> usize {
        (self.0 - Self::FIRST.0) as usize
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Year> {
        (Self::FIRST.0..=Self::LAST.0).map(Year)
    }
}

impl Default for Year {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record of the wide expenditure table as read from the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenditureRow {
    /// Free-text country name; `None` when the row has no name field
    pub name: Option<String>,
    /// Raw cell text per year column present in the row
    pub values: BTreeMap<Year, String>,
}

impl ExpenditureRow {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, year: Year, text: impl Into<String>) -> Self {
        self.values.insert(year, text.into());
        self
    }
}

/// Expenditure for every year in range. `None` means no data, which is
/// distinct from a recorded zero.
pub type YearSeries = [Option<f64>; Year::SPAN];

/// Canonical country name → dense year series. Built once per load.
#[derive(Debug, Clone, Default)]
pub struct ExpenditureLookup {
    countries: HashMap<String, YearSeries>,
}

impl ExpenditureLookup {
    /// Value for a country and year; `None` if either is missing
    pub fn value(&self, country: &str, year: Year) -> Option<f64> {
        self.countries.get(country).and_then(|series| series[year.index()])
    }

    pub fn series(&self, country: &str) -> Option<&YearSeries> {
        self.countries.get(country)
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries.contains_key(country)
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.countries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Coverage and peak of one country's series
    pub fn summary(&self, country: &str) -> Option<SeriesSummary> {
        let series = self.series(country)?;
        let mut with_data = Year::all().filter_map(|y| series[y.index()].map(|v| (y, v)));

        let first = with_data.next();
        let mut summary = SeriesSummary {
            first_year: first.map(|(y, _)| y),
            last_year: first.map(|(y, _)| y),
            peak: first,
            years_with_data: first.is_some() as usize,
        };
        for (year, value) in with_data {
            summary.last_year = Some(year);
            summary.years_with_data += 1;
            if summary.peak.map_or(true, |(_, peak)| value > peak) {
                summary.peak = Some((year, value));
            }
        }
        Some(summary)
    }
}

/// Coverage of a single country's series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub first_year: Option<Year>,
    pub last_year: Option<Year>,
    pub peak: Option<(Year, f64)>,
    pub years_with_data: usize,
}

/// Reshape table rows into the canonical lookup.
///
/// Nameless rows are skipped. Names go through `aliases`; when two rows end
/// up with the same canonical name the later row wins.
pub fn build_lookup<I>(rows: I, aliases: &NameAliasTable) -> ExpenditureLookup
where
    I: IntoIterator<Item = ExpenditureRow>,
{
    let mut countries = HashMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some(raw_name) = row.name else {
            skipped += 1;
            warn!("skipping expenditure row without a country name");
            continue;
        };
        let country = aliases.normalize(&raw_name).to_string();

        let mut series: YearSeries = [None; Year::SPAN];
        for year in Year::all() {
            series[year.index()] = row
                .values
                .get(&year)
                .and_then(|text| parse_cell(&country, year, text));
        }

        if countries.insert(country.clone(), series).is_some() {
            debug!(%country, raw = %raw_name, "later row replaces earlier entry");
        }
    }

    info!(countries = countries.len(), skipped, "built expenditure lookup");
    ExpenditureLookup { countries }
}

fn parse_cell(country: &str, year: Year, text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warn!(%country, %year, cell = text, "non-numeric expenditure cell treated as no data");
            None
        }
    }
}
