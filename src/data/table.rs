use std::io::Read;
use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use crate::data::lookup::{ExpenditureRow, Year};
use crate::error::LoadError;

/// Header of the country-name column in the World Bank style tables
pub const DEFAULT_NAME_COLUMN: &str = "Name";

/// Parse a wide table: one row per country, one column per year.
///
/// Headers that are not `name_column` or a year in range are ignored. Short
/// rows are accepted; their missing cells are simply absent.
pub fn parse_rows<R: Read>(reader: R, name_column: &str) -> Result<Vec<ExpenditureRow>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let name_idx = headers.iter().position(|h| h.trim() == name_column);
    if name_idx.is_none() {
        warn!(column = name_column, "country name column missing; every row will be skipped");
    }

    let year_columns: Vec<(usize, Year)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| Year::from_header(header).map(|year| (idx, year)))
        .collect();
    debug!(year_columns = year_columns.len(), "table header parsed");

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;

        let name = name_idx
            .and_then(|idx| record.get(idx))
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string);

        let values = year_columns
            .iter()
            .filter_map(|&(idx, year)| record.get(idx).map(|cell| (year, cell.to_string())))
            .collect();

        rows.push(ExpenditureRow { name, values });
    }

    Ok(rows)
}

/// Read and parse a table from disk
pub async fn load_table(path: &Path, name_column: &str) -> Result<Vec<ExpenditureRow>, LoadError> {
    let bytes = fs::read(path).await.map_err(|e| LoadError::io(path, e))?;
    let rows = parse_rows(bytes.as_slice(), name_column).map_err(|e| LoadError::csv(path, e))?;
    debug!(path = %path.display(), rows = rows.len(), "table loaded");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(v: i64) -> Year {
        Year::new(v).unwrap()
    }

    #[test]
    fn test_wide_table() {
        let csv = "Name,Code,1960,1961,2020\n\
                   Russian Federation,RUS,,1.5,61700000000\n\
                   France,FRA,3,,\n";
        let rows = parse_rows(csv.as_bytes(), DEFAULT_NAME_COLUMN).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some("Russian Federation"));
        assert_eq!(rows[0].values.get(&year(1960)).map(String::as_str), Some(""));
        assert_eq!(rows[0].values.get(&year(2020)).map(String::as_str), Some("61700000000"));
        // Non-year columns are not carried
        assert_eq!(rows[0].values.len(), 3);
        assert_eq!(rows[1].values.get(&year(1960)).map(String::as_str), Some("3"));
    }

    #[test]
    fn test_short_row_and_blank_name() {
        let csv = "Name,2000,2001\n\
                   Peru,5\n\
                   ,7,8\n";
        let rows = parse_rows(csv.as_bytes(), DEFAULT_NAME_COLUMN).unwrap();

        assert_eq!(rows[0].name.as_deref(), Some("Peru"));
        assert!(rows[0].values.get(&year(2001)).is_none());
        assert_eq!(rows[1].name, None);
    }

    #[test]
    fn test_missing_name_column() {
        let csv = "Country,2000\nPeru,5\n";
        let rows = parse_rows(csv.as_bytes(), DEFAULT_NAME_COLUMN).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, None);
    }

    #[test]
    fn test_out_of_range_year_headers_ignored() {
        let csv = "Name,1959,1960,2021\nPeru,1,2,3\n";
        let rows = parse_rows(csv.as_bytes(), DEFAULT_NAME_COLUMN).unwrap();
        assert_eq!(rows[0].values.len(), 1);
        assert_eq!(rows[0].values.get(&year(1960)).map(String::as_str), Some("2"));
    }
}
