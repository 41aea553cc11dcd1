//! Call record model
//!
//! A single telephony event. A call is described by one Start and one End
//! record sharing the same call identifier.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AppError;

/// Accepted textual timestamp formats, second precision
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];

/// Kind of telephony event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Start,
    End,
}

impl RecordKind {
    /// Database/API string value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            other => Err(AppError::InvalidInput(format!(
                "Unknown record type: {}",
                other
            ))),
        }
    }
}

/// Call record entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Record identifier (storage-assigned unless supplied by the client)
    pub id: Option<i64>,

    /// Start or End event
    pub kind: RecordKind,

    /// Local clock time of the event
    pub timestamp: NaiveDateTime,

    /// Correlates the Start and End records of one call
    pub call_identifier: i64,

    /// Calling number (Start records only)
    pub origin_number: Option<String>,

    /// Called number (Start records only)
    pub destination_number: Option<String>,
}

impl CallRecord {
    /// Create a Start record
    pub fn start(
        call_identifier: i64,
        timestamp: NaiveDateTime,
        origin_number: impl Into<String>,
        destination_number: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind: RecordKind::Start,
            timestamp,
            call_identifier,
            origin_number: Some(origin_number.into()),
            destination_number: Some(destination_number.into()),
        }
    }

    /// Create an End record
    pub fn end(call_identifier: i64, timestamp: NaiveDateTime) -> Self {
        Self {
            id: None,
            kind: RecordKind::End,
            timestamp,
            call_identifier,
            origin_number: None,
            destination_number: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[inline]
    pub fn is_start(&self) -> bool {
        self.kind == RecordKind::Start
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.kind == RecordKind::End
    }

    /// Parse `YYYY-MM-DDTHH:MM:SS`, with or without a trailing `Z`
    ///
    /// The year must be exactly four digits; signed or longer years are
    /// rejected.
    pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        let year = value.get(..5)?.as_bytes();
        if !(year[..4].iter().all(u8::is_ascii_digit) && year[4] == b'-') {
            return None;
        }

        TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    }
}

/// Phone numbers are 10 or 11 ASCII digits (area code + subscriber)
pub fn is_valid_phone_number(number: &str) -> bool {
    (10..=11).contains(&number.len()) && number.bytes().all(|b| b.is_ascii_digit())
}
