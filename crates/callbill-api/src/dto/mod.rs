//! Data Transfer Objects for API requests and responses

pub mod bill;
pub mod call_record;
pub mod common;
pub mod quote;

pub use bill::{BillResponse, PhoneBillQuery, PricedCallResponse};
pub use call_record::{CallRecordRequest, ProcessedResponse};
pub use common::ApiResponse;
pub use quote::{QuoteRequest, QuoteResponse, SegmentResponse};
