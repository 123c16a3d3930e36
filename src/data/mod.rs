pub mod boundaries;
pub mod lookup;
pub mod names;
pub mod table;

use std::path::PathBuf;

use tracing::info;

use crate::error::LoadError;
use boundaries::{load_boundaries, BoundaryFeature};
use lookup::ExpenditureRow;
use table::load_table;

/// Where the session's data comes from
#[derive(Debug, Clone)]
pub struct DataSources {
    pub boundaries: PathBuf,
    pub expenditure: PathBuf,
    /// GDP table; fetched alongside the others but not displayed
    pub gdp: Option<PathBuf>,
    pub name_column: String,
}

/// Everything a completed fetch produced
#[derive(Debug)]
pub struct LoadedData {
    pub boundaries: Vec<BoundaryFeature>,
    pub expenditure: Vec<ExpenditureRow>,
    pub gdp_rows: usize,
}

/// Fetch all sources concurrently and wait for every one of them.
/// The first failing source (in declaration order) is reported.
pub async fn fetch_all(sources: &DataSources) -> Result<LoadedData, LoadError> {
    info!(
        boundaries = %sources.boundaries.display(),
        expenditure = %sources.expenditure.display(),
        "loading data"
    );

    let gdp = async {
        match &sources.gdp {
            Some(path) => load_table(path, &sources.name_column).await.map(|rows| rows.len()),
            None => Ok(0),
        }
    };

    let (boundaries, expenditure, gdp) = tokio::join!(
        load_boundaries(&sources.boundaries),
        load_table(&sources.expenditure, &sources.name_column),
        gdp
    );

    let data = LoadedData {
        boundaries: boundaries?,
        expenditure: expenditure?,
        gdp_rows: gdp?,
    };
    info!(
        features = data.boundaries.len(),
        rows = data.expenditure.len(),
        gdp_rows = data.gdp_rows,
        "data loaded"
    );
    Ok(data)
}
