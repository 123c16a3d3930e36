use rayon::prelude::*;

use crate::data::boundaries::BoundaryFeature;
use crate::map::geometry::feature_at;
use crate::map::projection::Viewport;
use crate::map::spatial::FeatureGrid;

/// Which feature covers each terminal cell of the map area.
///
/// Depends only on geometry and the viewport, so changing the year reuses it
/// and only the colors looked up through the layer change.
#[derive(Debug, Clone)]
pub struct HitRaster {
    viewport: Viewport,
    cols: u16,
    rows: u16,
    cells: Vec<Option<u32>>,
}

impl HitRaster {
    pub fn build(
        features: &[BoundaryFeature],
        grid: &FeatureGrid,
        viewport: &Viewport,
        cols: u16,
        rows: u16,
    ) -> Self {
        let cells = (0..rows)
            .into_par_iter()
            .flat_map_iter(|row| {
                (0..cols).map(move |col| {
                    let (lon, lat) = viewport.cell_center(col, row);
                    feature_at(features, grid, lon, lat).map(|idx| idx as u32)
                })
            })
            .collect();

        Self {
            viewport: viewport.clone(),
            cols,
            rows,
            cells,
        }
    }

    /// True if this raster was built for exactly this view
    pub fn matches(&self, viewport: &Viewport, cols: u16, rows: u16) -> bool {
        self.cols == cols && self.rows == rows && self.viewport == *viewport
    }

    /// Feature index at (col, row) of the map area
    pub fn get(&self, col: u16, row: u16) -> Option<usize> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells[row as usize * self.cols as usize + col as usize].map(|idx| idx as usize)
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::spatial::DEFAULT_CELL_DEGREES;
    use geo::{polygon, MultiPolygon};

    fn west_east() -> Vec<BoundaryFeature> {
        let west = polygon![(x: -60.0, y: -40.0), (x: -1.0, y: -40.0), (x: -1.0, y: 40.0), (x: -60.0, y: 40.0)];
        let east = polygon![(x: 1.0, y: -40.0), (x: 60.0, y: -40.0), (x: 60.0, y: 40.0), (x: 1.0, y: 40.0)];
        vec![
            BoundaryFeature::new("West", MultiPolygon::new(vec![west])).unwrap(),
            BoundaryFeature::new("East", MultiPolygon::new(vec![east])).unwrap(),
        ]
    }

    #[test]
    fn test_cells_resolve_features() {
        let features = west_east();
        let grid = FeatureGrid::build(features.iter().map(|f| f.bbox), DEFAULT_CELL_DEGREES);
        // 40×10 cells = 80×40 dots, zoomed so ±60° fills most of the width
        let viewport = Viewport::new(0.0, 0.0, 2.0, 80, 40);
        let raster = HitRaster::build(&features, &grid, &viewport, 40, 10);

        assert_eq!(raster.get(12, 5), Some(0));
        assert_eq!(raster.get(28, 5), Some(1));
        assert_eq!(raster.get(0, 5), None);
        assert_eq!(raster.get(40, 5), None);
        assert!(raster.matches(&viewport, 40, 10));
    }

    #[test]
    fn test_matches_tracks_view() {
        let features = west_east();
        let grid = FeatureGrid::build(features.iter().map(|f| f.bbox), DEFAULT_CELL_DEGREES);
        let mut viewport = Viewport::world(80, 40);
        let raster = HitRaster::build(&features, &grid, &viewport, 40, 10);

        assert!(!raster.matches(&viewport, 41, 10));
        viewport.zoom_in();
        assert!(!raster.matches(&viewport, 40, 10));
    }
}
