use geo::{Contains, LineString, Point};

use crate::braille::BrailleCanvas;
use crate::data::boundaries::BoundaryFeature;
use crate::map::projection::Viewport;
use crate::map::spatial::FeatureGrid;

/// Bresenham line between two dot positions
pub fn draw_line(canvas: &mut BrailleCanvas, from: (i32, i32), to: (i32, i32)) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let step_x = if x < x1 { 1 } else { -1 };
    let step_y = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        canvas.set(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += step_x;
        }
        if e2 <= dx {
            err += dx;
            y += step_y;
        }
    }
}

/// Longitude gap beyond which an edge is taken to wrap around the antimeridian
const ANTIMERIDIAN_GAP: f64 = 180.0;

/// Draw a projected ring, skipping off-screen segments and edges that wrap
/// around the antimeridian.
fn draw_ring(canvas: &mut BrailleCanvas, ring: &LineString<f64>, viewport: &Viewport) {
    for edge in ring.lines() {
        if (edge.end.x - edge.start.x).abs() > ANTIMERIDIAN_GAP {
            continue;
        }
        let from = viewport.project(edge.start.x, edge.start.y);
        let to = viewport.project(edge.end.x, edge.end.y);
        if viewport.line_might_be_visible(from, to) {
            draw_line(canvas, from, to);
        }
    }
}

/// Outline every visible feature (exterior and hole rings)
pub fn draw_outlines(canvas: &mut BrailleCanvas, features: &[BoundaryFeature], viewport: &Viewport) {
    for feature in features {
        if !viewport.bbox_might_be_visible(&feature.bbox) {
            continue;
        }
        for polygon in &feature.geometry {
            draw_ring(canvas, polygon.exterior(), viewport);
            for hole in polygon.interiors() {
                draw_ring(canvas, hole, viewport);
            }
        }
    }
}

/// Index of the first feature containing (lon, lat)
pub fn feature_at(features: &[BoundaryFeature], grid: &FeatureGrid, lon: f64, lat: f64) -> Option<usize> {
    let point = Point::new(lon, lat);
    grid.candidates(lon, lat).iter().copied().find(|&idx| {
        features
            .get(idx)
            .is_some_and(|f| f.bbox.contains(&point) && f.geometry.contains(&point))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::spatial::DEFAULT_CELL_DEGREES;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, (0, 0), (9, 0));
        // Top dot row of every cell
        assert_eq!(canvas.row_string(0), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, (0, 0), (0, 7));
        assert_eq!(canvas.glyph(0, 0), Some('⡇'));
        assert_eq!(canvas.glyph(0, 1), Some('⡇'));
    }

    #[test]
    fn test_reverse_line_matches() {
        let mut forward = BrailleCanvas::new(4, 2);
        let mut backward = BrailleCanvas::new(4, 2);
        draw_line(&mut forward, (0, 0), (7, 7));
        draw_line(&mut backward, (7, 7), (0, 0));
        assert_eq!(forward.row_string(0), backward.row_string(0));
        assert_eq!(forward.row_string(1), backward.row_string(1));
    }

    fn ring_with_hole() -> Vec<BoundaryFeature> {
        let outer = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 20.0), (x: 0.0, y: 20.0)],
            interiors: [[(x: 5.0, y: 5.0), (x: 15.0, y: 5.0), (x: 15.0, y: 15.0), (x: 5.0, y: 15.0)]],
        );
        let inner = polygon![(x: 6.0, y: 6.0), (x: 14.0, y: 6.0), (x: 14.0, y: 14.0), (x: 6.0, y: 14.0)];
        vec![
            BoundaryFeature::new("Outer", MultiPolygon::new(vec![outer])).unwrap(),
            BoundaryFeature::new("Enclave", MultiPolygon::new(vec![inner])).unwrap(),
        ]
    }

    #[test]
    fn test_feature_at_respects_holes() {
        let features = ring_with_hole();
        let grid = FeatureGrid::build(features.iter().map(|f| f.bbox), DEFAULT_CELL_DEGREES);

        assert_eq!(feature_at(&features, &grid, 2.0, 2.0), Some(0));
        assert_eq!(feature_at(&features, &grid, 10.0, 10.0), Some(1));
        // In the hole but outside the enclave
        assert_eq!(feature_at(&features, &grid, 5.5, 10.0), None);
        assert_eq!(feature_at(&features, &grid, 40.0, 10.0), None);
    }

    #[test]
    fn test_outlines_draw_something_visible() {
        let features = ring_with_hole();
        let viewport = Viewport::new(10.0, 10.0, 8.0, 40, 40);
        let mut canvas = BrailleCanvas::new(20, 10);
        draw_outlines(&mut canvas, &features, &viewport);

        let drawn = (0..canvas.height())
            .flat_map(|row| (0..canvas.width()).map(move |col| (col, row)))
            .filter(|&(col, row)| canvas.glyph(col, row).is_some())
            .count();
        assert!(drawn > 0);
    }

    fn drawn_cells(canvas: &BrailleCanvas) -> usize {
        (0..canvas.height())
            .flat_map(|row| (0..canvas.width()).map(move |col| (col, row)))
            .filter(|&(col, row)| canvas.glyph(col, row).is_some())
            .count()
    }

    #[test]
    fn test_edges_longer_than_the_screen_are_drawn() {
        let wide = polygon![(x: -30.0, y: 0.0), (x: 30.0, y: 0.0), (x: 30.0, y: 20.0), (x: -30.0, y: 20.0)];
        let features = vec![BoundaryFeature::new("Wide", MultiPolygon::new(vec![wide])).unwrap()];
        // Zoomed onto the middle of the southern edge
        let viewport = Viewport::new(0.0, 0.0, 8.0, 40, 40);
        let mut canvas = BrailleCanvas::new(20, 10);
        draw_outlines(&mut canvas, &features, &viewport);
        assert!(drawn_cells(&canvas) > 0);
    }

    #[test]
    fn test_antimeridian_wrap_is_skipped() {
        // Both points sit near the screen edges; the edge between them wraps the globe
        let viewport = Viewport::new(180.0, 0.0, 1.0, 40, 40);
        let ring = LineString::from(vec![(170.0, 0.0), (-170.0, 0.0)]);
        let mut canvas = BrailleCanvas::new(20, 10);
        draw_ring(&mut canvas, &ring, &viewport);
        assert_eq!(drawn_cells(&canvas), 0);

        let ring = LineString::from(vec![(170.0, 0.0), (179.0, 0.0)]);
        draw_ring(&mut canvas, &ring, &viewport);
        assert!(drawn_cells(&canvas) > 0);
    }
}
