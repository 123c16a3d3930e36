pub mod choropleth;
pub mod geometry;
pub mod projection;
pub mod raster;
pub mod scale;
pub mod spatial;

pub use choropleth::{render, ChoroplethLayer, DetailsSink, MapSurface};
pub use projection::Viewport;
pub use raster::HitRaster;
pub use spatial::FeatureGrid;
