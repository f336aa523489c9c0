#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line front end.
pub mod cli;
/// Deployment configuration: features, items, additional document forms.
pub mod config;
/// Consumption over a trailing window of weeks or months.
pub mod consumption;
/// Centralized constants: field suffixes, date fields, default form identifiers.
pub mod constants;
/// Report documents and field lookup.
pub mod data;
/// Reported-date resolution and ISO date parsing.
pub mod dates;
/// Report kinds and the per-deployment effect table.
pub mod effects;
/// Per-item field name construction.
pub mod fields;
/// Checkpoint location and ledger replay.
pub mod ledger;
/// Loading configuration files and report dumps.
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Best-effort value coercion.
pub mod utils;

mod errors;

pub use config::{
    AdditionalDocForms, ConfirmSupply, FeatureConfig, FormCollision, FormRef, Item, ItemSet,
    StockConfig, StockOrder, StockReturn, StockSupply, Workflow,
};
pub use consumption::{Consumption, ConsumptionWindow, MovementKind, Period, consumption};
pub use data::Report;
pub use effects::{EffectTable, ReportKind, SupplyGate};
pub use errors::StockError;
pub use ledger::{Checkpoint, Ledger, LedgerEngine, current_quantities};
pub use types::{FieldName, FormName, ItemName, Quantity, ReportId};
