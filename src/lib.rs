//! Population dashboard over a prefecture / year CSV.
//!
//! Every interaction runs one pass: the table is loaded from disk, filtered by
//! the current [`view::Selection`], aggregated and reshaped into a
//! [`pass::Dashboard`] which the terminal UI (or the headless report) renders.

pub mod app;
pub mod config;
pub mod csv_reader;
pub mod dataset;
pub mod error;
pub mod format;
pub mod logging;
pub mod pass;
pub mod ui;
pub mod view;

pub use crate::csv_reader::{CsvSource, TableSource};
pub use crate::dataset::{PopulationRecord, Sex};
pub use crate::error::{ConfigError, LoadError};
pub use crate::pass::{compute, run_pass, Dashboard};
pub use crate::view::{FilterOptions, FilteredView, Selection, Totals};
