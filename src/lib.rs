//! Terminal choropleth of military expenditure by country and year.
//!
//! Boundaries (GeoJSON) and a wide expenditure table (CSV) are loaded once;
//! the table is reshaped into an [`data::lookup::ExpenditureLookup`] keyed by
//! the boundary dataset's country names, and the map is restyled from that
//! lookup whenever the selected year changes.

pub mod braille;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod logging;
pub mod map;
pub mod ui;
