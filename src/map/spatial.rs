use std::collections::HashMap;

use geo::Rect;

/// Grid cell size used for country bounding boxes
pub const DEFAULT_CELL_DEGREES: f64 = 10.0;

/// Bounding-box index over boundary features.
///
/// Each feature index is stored in every cell its bbox overlaps, so a point
/// query never misses a feature; candidates still need an exact
/// point-in-polygon test.
#[derive(Debug, Clone)]
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn build(bounds: impl IntoIterator<Item = Rect<f64>>, cell_size: f64) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size,
        };
        for (idx, bbox) in bounds.into_iter().enumerate() {
            let (x0, y0) = grid.to_cell(bbox.min().x, bbox.min().y);
            let (x1, y1) = grid.to_cell(bbox.max().x, bbox.max().y);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        (
            (lon / self.cell_size).floor() as i32,
            (lat / self.cell_size).floor() as i32,
        )
    }

    /// Features whose bbox may contain (lon, lat), in insertion order
    pub fn candidates(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
    }

    #[test]
    fn test_point_queries() {
        let grid = FeatureGrid::build(
            [rect(0.0, 0.0, 5.0, 5.0), rect(3.0, 3.0, 25.0, 8.0)],
            DEFAULT_CELL_DEGREES,
        );

        assert_eq!(grid.candidates(1.0, 1.0), &[0, 1]);
        assert_eq!(grid.candidates(21.0, 4.0), &[1]);
        assert!(grid.candidates(-50.0, 4.0).is_empty());
        assert_eq!(grid.occupied_cells(), 3);
    }

    #[test]
    fn test_no_false_negatives_on_edges() {
        let grid = FeatureGrid::build([rect(-10.0, -10.0, 10.0, 10.0)], DEFAULT_CELL_DEGREES);
        for &(lon, lat) in &[(-10.0, -10.0), (10.0, 10.0), (0.0, 0.0), (-10.0, 10.0)] {
            assert_eq!(grid.candidates(lon, lat), &[0], "({lon}, {lat})");
        }
    }
}
