//! Domain Layer - Core types for the GEX engine
//!
//! Pure data types with no I/O. All external interactions happen through
//! the ports layer.
//!
//! - `chain`: normalized per-strike call/put accumulators
//! - `profile`: per-request gamma exposure profile
//! - `history`: day-scoped bounded IV history log and its key derivation
//! - `error`: request-level error kinds

pub mod chain;
pub mod profile;
pub mod history;
pub mod error;

pub use chain::{
    valid_iv, ContractLeg, NormalizedChain, OptionSide, PutGammaPolicy, SideAccumulator,
    StrikeAggregate, IV_CEILING,
};
pub use profile::{GexProfile, StrikeRecord};
pub use history::{
    exchange_day, history_key, IvHistory, IvHistoryLog, IvHistoryRecord, DEFAULT_HISTORY_CAP,
    DEFAULT_HISTORY_TTL_SECS,
};
pub use error::{GexError, GexResult};
