//! Data models for the asset tracker.
//!
//! This module contains the structures that cross the sync boundary:
//!
//! - `AssetRecord`: a single financial record (holding or transaction row)
//! - `RemoteDocument`, `Settings`: the per-user persisted document shape
//! - `ExchangeRateTable`: cached currency multipliers relative to the base

pub mod asset;
pub mod document;
pub mod rates;

pub use asset::AssetRecord;
pub use document::{RemoteDocument, Settings};
pub use rates::ExchangeRateTable;
