use std::path::Path;

use geo::{BoundingRect, Geometry, MultiPolygon, Rect};
use geojson::{Feature, GeoJson};
use rayon::prelude::*;
use tokio::fs;
use tracing::debug;

use crate::error::LoadError;

/// A named country outline from the boundary dataset
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    /// `properties.name`, used verbatim as the join key
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    /// Lon/lat bounding box of `geometry`
    pub bbox: Rect<f64>,
}

impl BoundaryFeature {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Option<Self> {
        let bbox = geometry.bounding_rect()?;
        Some(Self {
            name: name.into(),
            geometry,
            bbox,
        })
    }
}

/// Read and parse a GeoJSON FeatureCollection from disk
pub async fn load_boundaries(path: &Path) -> Result<Vec<BoundaryFeature>, LoadError> {
    let mut bytes = fs::read(path).await.map_err(|e| LoadError::io(path, e))?;
    let features = parse_boundaries(&mut bytes, path)?;
    debug!(path = %path.display(), features = features.len(), "boundaries loaded");
    Ok(features)
}

/// Parse GeoJSON bytes (simd-json mutates the buffer in place).
///
/// Features without a string `name` or without polygon geometry are dropped.
pub fn parse_boundaries(bytes: &mut [u8], path: &Path) -> Result<Vec<BoundaryFeature>, LoadError> {
    let value: serde_json::Value =
        simd_json::serde::from_slice(bytes).map_err(|e| LoadError::geojson(path, e))?;
    let geojson = GeoJson::from_json_value(value).map_err(|e| LoadError::geojson(path, e))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(LoadError::NotFeatureCollection {
            path: path.to_path_buf(),
        });
    };

    let total = collection.features.len();
    let features: Vec<BoundaryFeature> = collection
        .features
        .into_par_iter()
        .filter_map(boundary_from_feature)
        .collect();

    if features.len() < total {
        debug!(kept = features.len(), dropped = total - features.len(), "dropped unusable boundary features");
    }
    Ok(features)
}

fn boundary_from_feature(feature: Feature) -> Option<BoundaryFeature> {
    let name = match feature.properties.as_ref().and_then(|props| props.get("name")) {
        Some(serde_json::Value::String(name)) => name.clone(),
        _ => {
            debug!(id = ?feature.id, "boundary feature without a name");
            return None;
        }
    };

    let geometry: Geometry<f64> = feature.geometry?.value.try_into().ok()?;
    let geometry = match geometry {
        Geometry::MultiPolygon(mp) => mp,
        Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        _ => {
            debug!(%name, "boundary feature is not polygonal");
            return None;
        }
    };

    BoundaryFeature::new(name, geometry)
}
