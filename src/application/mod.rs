//! Application Layer - Use cases
//!
//! `GexService` runs one profile request end to end; `HistoryRecorder`
//! keeps the day-scoped IV log in the key-value store.

pub mod gex_service;
pub mod history_recorder;

pub use gex_service::GexService;
pub use history_recorder::{HistoryRecorder, HistorySettings};
