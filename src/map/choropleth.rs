//! Year-specific styling of the boundary features.
//!
//! A [`ChoroplethLayer`] is derived from the boundaries and an already-built
//! [`ExpenditureLookup`]; building one never touches the lookup beyond reading
//! it. A [`MapSurface`] holds at most one layer at a time.

use ratatui::style::Color;
use tracing::debug;

use crate::data::boundaries::BoundaryFeature;
use crate::data::lookup::{ExpenditureLookup, Year};
use crate::map::scale::{self, Bucket};

/// Tooltip text for countries without a value
pub const NO_DATA_LABEL: &str = "No data";

/// Receives detail requests when a country is clicked.
pub trait DetailsSink {
    fn show_details(&mut self, country: &str, year: Year);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    NoData,
    Bucket(Bucket),
}

impl Fill {
    pub fn color(self) -> Color {
        match self {
            Fill::NoData => scale::no_data_color(),
            Fill::Bucket(bucket) => bucket.color(),
        }
    }
}

/// Style and interaction data for one boundary feature
#[derive(Debug, Clone, PartialEq)]
pub struct StyledFeature {
    pub country: String,
    pub value: Option<f64>,
    pub fill: Fill,
    pub tooltip: String,
}

/// Styled features for one year, index-aligned with the boundary list
#[derive(Debug, Clone)]
pub struct ChoroplethLayer {
    year: Year,
    features: Vec<StyledFeature>,
}

impl ChoroplethLayer {
    pub fn year(&self) -> Year {
        self.year
    }

    pub fn features(&self) -> &[StyledFeature] {
        &self.features
    }

    pub fn feature(&self, index: usize) -> Option<&StyledFeature> {
        self.features.get(index)
    }

    pub fn tooltip(&self, index: usize) -> Option<&str> {
        self.feature(index).map(|f| f.tooltip.as_str())
    }

    /// Forward a click on feature `index` to `sink` as (country, year)
    pub fn click(&self, index: usize, sink: &mut dyn DetailsSink) -> bool {
        match self.feature(index) {
            Some(feature) => {
                sink.show_details(&feature.country, self.year);
                true
            }
            None => false,
        }
    }
}

/// Style every boundary feature for `year`.
pub fn render(boundaries: &[BoundaryFeature], lookup: &ExpenditureLookup, year: Year) -> ChoroplethLayer {
    let features = boundaries
        .iter()
        .map(|boundary| {
            let value = lookup.value(&boundary.name, year);
            StyledFeature {
                fill: value.map_or(Fill::NoData, |v| Fill::Bucket(scale::color_for(v))),
                tooltip: tooltip_text(&boundary.name, value),
                country: boundary.name.clone(),
                value,
            }
        })
        .collect();

    ChoroplethLayer { year, features }
}

pub fn tooltip_text(country: &str, value: Option<f64>) -> String {
    let amount = value.map_or_else(|| NO_DATA_LABEL.to_string(), format_amount);
    format!("{country}\nMilitary Expenditure: {amount}")
}

/// Thousands-separated amount: `1234567.0` → `"1,234,567"`
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = format!("{:.2}", value.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if cents != "00" {
        grouped.push('.');
        grouped.push_str(cents);
    }
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// The map's single choropleth slot
#[derive(Debug, Default)]
pub struct MapSurface {
    layer: Option<ChoroplethLayer>,
    replacements: u64,
}

impl MapSurface {
    /// Attach `layer`, detaching and returning the previous one in the same step
    pub fn attach(&mut self, layer: ChoroplethLayer) -> Option<ChoroplethLayer> {
        let year = layer.year;
        let features = layer.features.len();
        let previous = self.layer.replace(layer);
        if previous.is_some() {
            self.replacements += 1;
        }
        debug!(%year, features, replacements = self.replacements, "choropleth layer attached");
        previous
    }

    pub fn layer(&self) -> Option<&ChoroplethLayer> {
        self.layer.as_ref()
    }

    pub fn attached_layers(&self) -> usize {
        usize::from(self.layer.is_some())
    }

    pub fn replacements(&self) -> u64 {
        self.replacements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::lookup::{build_lookup, ExpenditureRow};
    use crate::data::names::NameAliasTable;
    use geo::{polygon, MultiPolygon};

    fn square(name: &str, x: f64) -> BoundaryFeature {
        let poly = polygon![
            (x: x, y: 0.0),
            (x: x + 1.0, y: 0.0),
            (x: x + 1.0, y: 1.0),
            (x: x, y: 1.0),
        ];
        BoundaryFeature::new(name, MultiPolygon::new(vec![poly])).unwrap()
    }

    fn year(v: i64) -> Year {
        Year::new(v).unwrap()
    }

    #[derive(Default)]
    struct Recorder(Vec<(String, Year)>);

    impl DetailsSink for Recorder {
        fn show_details(&mut self, country: &str, year: Year) {
            self.0.push((country.to_string(), year));
        }
    }

    fn fixture() -> (Vec<BoundaryFeature>, ExpenditureLookup) {
        let boundaries = vec![square("Russia", 0.0), square("France", 2.0), square("Atlantis", 4.0)];
        let rows = vec![
            ExpenditureRow::named("Russian Federation")
                .with_value(year(2019), "10000000001")
                .with_value(year(2020), "61700000000"),
            ExpenditureRow::named("France").with_value(year(2019), "").with_value(year(2020), "0"),
        ];
        (boundaries, build_lookup(rows, &NameAliasTable::builtin()))
    }

    #[test]
    fn test_styles_and_tooltips() {
        let (boundaries, lookup) = fixture();
        let layer = render(&boundaries, &lookup, year(2019));

        assert_eq!(layer.year(), year(2019));
        assert_eq!(layer.features().len(), 3);

        let russia = layer.feature(0).unwrap();
        assert_eq!(russia.fill, Fill::Bucket(Bucket::Orange));
        assert_eq!(russia.tooltip, "Russia\nMilitary Expenditure: 10,000,000,001");

        let france = layer.feature(1).unwrap();
        assert_eq!(france.fill, Fill::NoData);
        assert!(france.tooltip.ends_with(NO_DATA_LABEL));
        assert_eq!(france.fill.color(), scale::no_data_color());
    }

    #[test]
    fn test_unmatched_feature_is_no_data() {
        let (boundaries, lookup) = fixture();
        let layer = render(&boundaries, &lookup, year(2019));

        let atlantis = layer.feature(2).unwrap();
        assert_eq!(atlantis.country, "Atlantis");
        assert_eq!(atlantis.value, None);
        assert_eq!(atlantis.fill, Fill::NoData);
        assert_eq!(atlantis.tooltip, "Atlantis\nMilitary Expenditure: No data");
    }

    #[test]
    fn test_zero_is_data_not_absence() {
        // A recorded zero is a value; it must not be styled as missing
        let (boundaries, lookup) = fixture();
        let layer = render(&boundaries, &lookup, year(2020));

        let france = layer.feature(1).unwrap();
        assert_eq!(france.value, Some(0.0));
        assert_eq!(france.fill, Fill::Bucket(Bucket::PaleYellow));
        assert_eq!(france.tooltip, "France\nMilitary Expenditure: 0");
    }

    #[test]
    fn test_click_reports_country_and_year() {
        let (boundaries, lookup) = fixture();
        let layer = render(&boundaries, &lookup, year(2020));
        let mut recorder = Recorder::default();

        assert!(layer.click(0, &mut recorder));
        assert!(!layer.click(9, &mut recorder));
        assert_eq!(recorder.0, vec![("Russia".to_string(), year(2020))]);
    }

    #[test]
    fn test_surface_holds_one_layer() {
        let (boundaries, lookup) = fixture();
        let mut surface = MapSurface::default();
        assert_eq!(surface.attached_layers(), 0);

        assert!(surface.attach(render(&boundaries, &lookup, year(2019))).is_none());
        assert_eq!(surface.attached_layers(), 1);

        let detached = surface.attach(render(&boundaries, &lookup, year(2020))).unwrap();
        assert_eq!(detached.year(), year(2019));
        assert_eq!(surface.attached_layers(), 1);
        assert_eq!(surface.layer().unwrap().year(), year(2020));
        assert_eq!(surface.replacements(), 1);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(800_000_000_000.0), "800,000,000,000");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(-1234.0), "-1,234");
    }
}
