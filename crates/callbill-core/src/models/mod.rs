//! Domain models for CallBill
//!
//! Call records, priced calls, bills, billing periods, and the tariff.

pub mod bill;
pub mod call_record;
pub mod period;
pub mod priced_call;
pub mod tariff;

pub use bill::Bill;
pub use call_record::{is_valid_phone_number, CallRecord, RecordKind};
pub use period::BillingPeriod;
pub use priced_call::PricedCall;
pub use tariff::{shift_instant, BandBoundaries, BandRate, TariffBand, TariffSchedule};
