//! Module library and matcher.
//!
//! - [`catalog`]: the registry of physics-domain knowledge blocks
//! - [`matcher`]: two-signal selection and dependency closure

pub mod catalog;
pub mod matcher;

pub use catalog::{CatalogEntry, CatalogEquation, CatalogParameter, ModuleLibrary};
pub use matcher::{MatchSignals, ModuleMatcher, Resolution, MIN_SIGNALS};
