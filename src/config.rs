use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::lookup::Year;
use crate::data::names::NameAliasTable;
use crate::data::table::DEFAULT_NAME_COLUMN;
use crate::data::DataSources;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub view: ViewConfig,
    pub logging: LoggingConfig,
    /// Extra expenditure-name → boundary-name aliases
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub boundaries: PathBuf,
    pub expenditure: PathBuf,
    pub gdp: Option<PathBuf>,
    pub name_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            boundaries: PathBuf::from("data/countries.geo.json"),
            expenditure: PathBuf::from("data/Military Expenditure.csv"),
            gdp: None,
            name_column: DEFAULT_NAME_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewConfig {
    pub initial_year: i64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            initial_year: Year::DEFAULT.get() as i64,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("milspend-map.log"),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content)
    }

    /// Defaults when `path` does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    pub fn initial_year(&self) -> Result<Year> {
        Year::new(self.view.initial_year).context("Invalid initial year")
    }

    pub fn sources(&self) -> DataSources {
        DataSources {
            boundaries: self.input.boundaries.clone(),
            expenditure: self.input.expenditure.clone(),
            gdp: self.input.gdp.clone(),
            name_column: self.input.name_column.clone(),
        }
    }

    pub fn alias_table(&self) -> NameAliasTable {
        NameAliasTable::builtin().with_overrides(self.aliases.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.input.name_column, "Name");
        assert_eq!(config.initial_year().unwrap(), Year::DEFAULT);
        assert!(config.input.gdp.is_none());
        assert_eq!(config.alias_table().len(), NameAliasTable::builtin().len());
    }

    #[test]
    fn test_full_file() {
        let config = AppConfig::parse(
            r#"
            [input]
            boundaries = "geo/world.json"
            expenditure = "tables/mil.csv"
            gdp = "tables/gdp.csv"

            [view]
            initial_year = 1991

            [logging]
            level = "debug"

            [aliases]
            "Korea, Rep." = "South Korea"
            "#,
        )
        .unwrap();

        let sources = config.sources();
        assert_eq!(sources.boundaries, PathBuf::from("geo/world.json"));
        assert_eq!(sources.gdp, Some(PathBuf::from("tables/gdp.csv")));
        assert_eq!(sources.name_column, "Name");
        assert_eq!(config.initial_year().unwrap().get(), 1991);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, PathBuf::from("milspend-map.log"));
        assert_eq!(config.alias_table().normalize("Korea, Rep."), "South Korea");
    }

    #[test]
    fn test_out_of_range_year_rejected() {
        let config = AppConfig::parse("[view]\ninitial_year = 2035\n").unwrap();
        assert!(config.initial_year().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_or_default(Path::new("/nonexistent/milspend.toml")).unwrap();
        assert_eq!(config.view.initial_year, 2020);
    }

    #[test]
    fn test_malformed_file() {
        assert!(AppConfig::parse("[view\n").is_err());
    }
}
