use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, error, info, warn};

use crate::data::boundaries::BoundaryFeature;
use crate::data::lookup::{build_lookup, ExpenditureLookup, Year};
use crate::data::names::NameAliasTable;
use crate::data::{fetch_all, DataSources, LoadedData};
use crate::error::LoadError;
use crate::map::geometry::feature_at;
use crate::map::spatial::DEFAULT_CELL_DEGREES;
use crate::map::{render, ChoroplethLayer, DetailsSink, FeatureGrid, HitRaster, MapSurface, Viewport};

/// Everything that exists once data has loaded
pub struct Session {
    boundaries: Vec<BoundaryFeature>,
    grid: FeatureGrid,
    lookup: Arc<ExpenditureLookup>,
    surface: MapSurface,
    raster: Option<HitRaster>,
}

impl Session {
    pub fn boundaries(&self) -> &[BoundaryFeature] {
        &self.boundaries
    }

    pub fn lookup(&self) -> &Arc<ExpenditureLookup> {
        &self.lookup
    }

    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn layer(&self) -> Option<&ChoroplethLayer> {
        self.surface.layer()
    }

    pub fn raster(&self) -> Option<&HitRaster> {
        self.raster.as_ref()
    }
}

/// Lifecycle of the view. There is no way back to `Loading`.
pub enum ViewState {
    Uninitialized,
    Loading,
    Ready(Session),
    Failed(LoadError),
}

impl ViewState {
    pub fn label(&self) -> &'static str {
        match self {
            ViewState::Uninitialized => "uninitialized",
            ViewState::Loading => "loading",
            ViewState::Ready(_) => "ready",
            ViewState::Failed(_) => "failed",
        }
    }
}

/// Result of a background load, tagged with the load that produced it
struct LoadOutcome {
    generation: u64,
    result: Result<LoadedData, LoadError>,
}

/// Session state: load lifecycle, selected year, viewport and pointer
pub struct ViewController {
    state: ViewState,
    sources: DataSources,
    aliases: NameAliasTable,
    year: Year,
    generation: u64,
    pending: Option<oneshot::Receiver<LoadOutcome>>,
    lookup_builds: u32,
    pub viewport: Viewport,
    /// Map area in terminal cells (inside the border)
    map_cols: u16,
    map_rows: u16,
    /// Last mouse position for drag tracking
    last_mouse: Option<(u16, u16)>,
    dragged: bool,
    /// Current mouse position for the tooltip
    pub mouse_pos: Option<(u16, u16)>,
    hovered: Option<usize>,
    pub should_quit: bool,
}

impl ViewController {
    pub fn new(
        sources: DataSources,
        aliases: NameAliasTable,
        year: Year,
        term_width: u16,
        term_height: u16,
    ) -> Self {
        let (map_cols, map_rows) = map_area(term_width, term_height);
        Self {
            state: ViewState::Uninitialized,
            sources,
            aliases,
            year,
            generation: 0,
            pending: None,
            lookup_builds: 0,
            viewport: Viewport::world(map_cols as usize * 2, map_rows as usize * 4),
            map_cols,
            map_rows,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
            hovered: None,
            should_quit: false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            ViewState::Ready(session) => Some(session),
            _ => None,
        }
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn map_size(&self) -> (u16, u16) {
        (self.map_cols, self.map_rows)
    }

    /// How many times a lookup has been built this session
    pub fn lookup_builds(&self) -> u32 {
        self.lookup_builds
    }

    /// Begin loading all sources on `runtime`. Only valid once, from `Uninitialized`.
    pub fn start(&mut self, runtime: &Handle) {
        if !matches!(self.state, ViewState::Uninitialized) {
            warn!(state = self.state.label(), "start ignored");
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let sources = self.sources.clone();
        let (tx, rx) = oneshot::channel();

        runtime.spawn(async move {
            let result = fetch_all(&sources).await;
            // The controller may be gone; then nobody wants the result
            if tx.send(LoadOutcome { generation, result }).is_err() {
                debug!(generation, "load finished after the view was dropped");
            }
        });

        self.pending = Some(rx);
        self.state = ViewState::Loading;
        info!(generation, "loading started");
    }

    /// Collect a finished load without blocking. Returns true if the state changed.
    pub fn poll_load(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => LoadOutcome {
                generation: self.generation,
                result: Err(LoadError::TaskFailed("load task ended without a result".into())),
            },
        };
        self.pending = None;
        self.finish_load(outcome)
    }

    fn finish_load(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.generation != self.generation || !matches!(self.state, ViewState::Loading) {
            warn!(
                generation = outcome.generation,
                current = self.generation,
                "discarding stale load result"
            );
            return false;
        }

        match outcome.result {
            Ok(data) => self.enter_ready(data),
            Err(err) => {
                error!(error = %err, "data load failed");
                self.state = ViewState::Failed(err);
            }
        }
        true
    }

    fn enter_ready(&mut self, data: LoadedData) {
        let lookup = Arc::new(build_lookup(data.expenditure, &self.aliases));
        self.lookup_builds += 1;

        let unmatched = data
            .boundaries
            .iter()
            .filter(|f| !lookup.contains(&f.name))
            .count();
        if unmatched > 0 {
            debug!(unmatched, "boundary features without expenditure rows");
        }

        let grid = FeatureGrid::build(data.boundaries.iter().map(|f| f.bbox), DEFAULT_CELL_DEGREES);
        let mut surface = MapSurface::default();
        surface.attach(render(&data.boundaries, &lookup, self.year));

        info!(
            year = %self.year,
            features = data.boundaries.len(),
            countries = lookup.len(),
            "view ready"
        );
        self.state = ViewState::Ready(Session {
            boundaries: data.boundaries,
            grid,
            lookup,
            surface,
            raster: None,
        });
    }

    /// Select a year and restyle the map. Ignored until data is ready.
    pub fn set_year(&mut self, year: Year) -> bool {
        let ViewState::Ready(session) = &mut self.state else {
            return false;
        };
        self.year = year;
        let layer = render(&session.boundaries, &session.lookup, year);
        session.surface.attach(layer);
        true
    }

    /// Move the year control by `delta`, clamped to the covered range
    pub fn step_year(&mut self, delta: i64) -> bool {
        self.set_year(self.year.offset(delta))
    }

    /// Update the map area when the terminal resizes
    pub fn resize(&mut self, term_width: u16, term_height: u16) {
        let (cols, rows) = map_area(term_width, term_height);
        self.map_cols = cols;
        self.map_rows = rows;
        self.viewport.width = cols as usize * 2;
        self.viewport.height = rows as usize * 4;
    }

    /// Rebuild the hit raster if the view changed since it was built, then
    /// re-resolve the hovered feature against it
    pub fn refresh_raster(&mut self) {
        let (cols, rows) = (self.map_cols, self.map_rows);
        let ViewState::Ready(session) = &mut self.state else {
            return;
        };
        if session
            .raster
            .as_ref()
            .is_some_and(|r| r.matches(&self.viewport, cols, rows))
        {
            return;
        }
        session.raster = Some(HitRaster::build(
            &session.boundaries,
            &session.grid,
            &self.viewport,
            cols,
            rows,
        ));
        // The map moved under a stationary pointer
        self.hovered = self
            .mouse_pos
            .and_then(|(col, row)| self.feature_under(col, row));
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a terminal position
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Terminal position → map cell, accounting for the border
    fn map_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let (c, r) = (col.checked_sub(1)?, row.checked_sub(1)?);
        (c < self.map_cols && r < self.map_rows).then_some((c, r))
    }

    /// Feature under a terminal position
    pub fn feature_under(&self, col: u16, row: u16) -> Option<usize> {
        let session = self.session()?;
        let (c, r) = self.map_cell(col, row)?;
        match &session.raster {
            Some(raster) if raster.matches(&self.viewport, self.map_cols, self.map_rows) => {
                raster.get(c, r)
            }
            _ => {
                let (lon, lat) = self.viewport.cell_center(c, r);
                feature_at(&session.boundaries, &session.grid, lon, lat)
            }
        }
    }

    /// Track the pointer and the feature under it
    pub fn hover_at(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.hovered = self.feature_under(col, row);
    }

    /// Tooltip of the hovered feature on the attached layer
    pub fn hovered_tooltip(&self) -> Option<&str> {
        let index = self.hovered?;
        self.session()?.layer()?.tooltip(index)
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Click at a terminal position; forwards (country, year) to `sink`
    pub fn click_at(&mut self, col: u16, row: u16, sink: &mut dyn DetailsSink) -> bool {
        let Some(index) = self.feature_under(col, row) else {
            return false;
        };
        let Some(layer) = self.session().and_then(Session::layer) else {
            return false;
        };
        layer.click(index, sink)
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan by the pointer movement since the last drag event
    pub fn mouse_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = last_col as i32 - col as i32;
            let dy = last_row as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                // Terminal cells are 2×4 braille dots
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
        self.hover_at(col, row);
    }

    /// Release: a press without movement is a click
    pub fn mouse_up(&mut self, col: u16, row: u16, sink: &mut dyn DetailsSink) -> bool {
        let was_click = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        was_click && self.click_at(col, row, sink)
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Map area inside the border and above the status bar
fn map_area(term_width: u16, term_height: u16) -> (u16, u16) {
    (term_width.saturating_sub(2), term_height.saturating_sub(3))
}

/// Terminal position → braille pixel inside the map
fn to_pixel(col: u16, row: u16) -> (i32, i32) {
    (col.saturating_sub(1) as i32 * 2, row.saturating_sub(1) as i32 * 4)
}
