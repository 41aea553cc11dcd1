//! Business logic services for CallBill
//!
//! This crate holds the pricing core and the bill workflow built on it.
//!
//! # Services
//!
//! - `BandSplitter` - splits a call into Standard/Reduced segments
//! - `TariffPricer` - prices a call from its band split
//! - `BillAggregator` - reconciles Start/End records into a stored bill
//!
//! Splitting and pricing are synchronous and free of I/O; only the
//! aggregator talks to storage, through the repository traits.

pub mod banding;
pub mod billing;
pub mod pricing;

pub use banding::{BandSegment, BandSplit, BandSplitter, MAX_CALL_DAYS};
pub use billing::BillAggregator;
pub use pricing::{PriceQuote, TariffPricer};
