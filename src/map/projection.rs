use std::f64::consts::PI;

use geo::Rect;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 64.0;
const ZOOM_STEP: f64 = 1.5;
/// Web Mercator is undefined at the poles
const MAX_LAT: f64 = 85.0;

/// Normalized Web Mercator coordinates, both in [0, 1] for the visible world
#[inline(always)]
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let x = (lon + 180.0) / 360.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

#[inline(always)]
fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Wrap a longitude into [-180, 180)
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Visible map area in braille pixels (2×4 per terminal cell)
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub center_lon: f64,
    pub center_lat: f64,
    /// 1.0 shows the whole world across the canvas width
    pub zoom: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Whole-world view, nudged north where most land is
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    #[inline(always)]
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale().max(1.0);
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let (lon, lat) = inverse_mercator(cx + dx as f64 / scale, cy + dy as f64 / scale);
        self.center_lon = wrap_lon(lon);
        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom keeping the point under (px, py) fixed on screen
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Geographic → pixel
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = mercator(lon, lat);
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale();

        let px = (x - cx) * scale + self.width as f64 / 2.0;
        let py = (y - cy) * scale + self.height as f64 / 2.0;
        (px as i32, py as i32)
    }

    /// Pixel → geographic (longitude not wrapped)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f64(px as f64, py as f64)
    }

    fn unproject_f64(&self, px: f64, py: f64) -> (f64, f64) {
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale().max(1.0);
        let x = (px - self.width as f64 / 2.0) / scale + cx;
        let y = (py - self.height as f64 / 2.0) / scale + cy;
        inverse_mercator(x, y)
    }

    /// Geographic position under the center of terminal cell (col, row)
    pub fn cell_center(&self, col: u16, row: u16) -> (f64, f64) {
        let (lon, lat) = self.unproject_f64(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0);
        (wrap_lon(lon), lat)
    }

    /// Rough test whether a lon/lat box overlaps the canvas
    pub fn bbox_might_be_visible(&self, bbox: &Rect<f64>) -> bool {
        let (x0, y0) = self.project(bbox.min().x, bbox.max().y);
        let (x1, y1) = self.project(bbox.max().x, bbox.min().y);
        self.line_might_be_visible((x0, y0), (x1, y1))
    }

    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(10.0, 30.0, 3.0, 400, 200);
        let (px, py) = vp.project(12.0, 31.0);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 12.0).abs() < 0.5, "{lon}");
        assert!((lat - 31.0).abs() < 0.5, "{lat}");
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, -10);
        assert!(vp.center_lat > 0.0);
    }

    #[test]
    fn test_pan_wraps_and_clamps() {
        let mut vp = Viewport::new(175.0, 0.0, 1.0, 100, 100);
        vp.pan(5, 0);
        assert!(vp.center_lon < 0.0);

        vp.pan(0, -10_000);
        assert!(vp.center_lat <= MAX_LAT);
    }

    #[test]
    fn test_zoom_limits() {
        let mut vp = Viewport::world(100, 100);
        for _ in 0..50 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom, MAX_ZOOM);
        for _ in 0..50 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_zoom_at_keeps_point() {
        let mut vp = Viewport::new(0.0, 0.0, 2.0, 200, 200);
        let before = vp.unproject(150, 60);
        vp.zoom_in_at(150, 60);
        let after = vp.unproject(150, 60);
        assert!((before.0 - after.0).abs() < 1.0);
        assert!((before.1 - after.1).abs() < 1.0);
    }

    #[test]
    fn test_cell_center_wraps() {
        let vp = Viewport::new(179.0, 0.0, 1.0, 100, 100);
        let (lon, _) = vp.cell_center(49, 12);
        assert!((-180.0..180.0).contains(&lon));
    }

    #[test]
    fn test_bbox_visibility() {
        let vp = Viewport::new(0.0, 0.0, 4.0, 100, 100);
        let near = Rect::new(coord! { x: -1.0, y: -1.0 }, coord! { x: 1.0, y: 1.0 });
        let far = Rect::new(coord! { x: 120.0, y: 40.0 }, coord! { x: 130.0, y: 50.0 });
        assert!(vp.bbox_might_be_visible(&near));
        assert!(!vp.bbox_might_be_visible(&far));
    }
}
