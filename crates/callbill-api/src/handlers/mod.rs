//! HTTP request handlers

pub mod health;
pub mod phone_bill;
pub mod phone_call;
pub mod tariff;

pub use health::configure as configure_health;
pub use phone_bill::configure as configure_phone_bill;
pub use phone_call::configure as configure_phone_call;
pub use tariff::configure as configure_tariff;
