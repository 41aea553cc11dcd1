//! Call record DTOs
//!
//! Intake payloads are deserialized leniently so every problem of a record
//! can be reported at once.

use callbill_core::models::{is_valid_phone_number, CallRecord, RecordKind};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{invalid_field, mandatory_field, push_validation_messages};

/// One call record as posted by the telephony platform
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CallRecordRequest {
    /// Optional client-side record id
    #[validate(range(min = 1, message = "The field id has an invalid value."))]
    pub id: Option<i64>,

    /// `start` or `end`
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// `YYYY-MM-DDTHH:MM:SS`, optionally followed by `Z`
    pub timestamp: Option<String>,

    #[validate(range(min = 1, message = "The field call_id has an invalid value."))]
    pub call_id: Option<i64>,

    /// Calling number, Start records only
    pub source: Option<String>,

    /// Called number, Start records only
    pub destination: Option<String>,
}

impl CallRecordRequest {
    /// Validate the payload and convert it into a call record
    ///
    /// Returns every validation message when the payload is rejected.
    pub fn to_call_record(&self) -> Result<CallRecord, Vec<String>> {
        let mut messages = Vec::new();
        if let Err(errors) = self.validate() {
            push_validation_messages(&mut messages, &errors);
        }

        let kind = match self.kind.as_deref() {
            None => {
                messages.push(mandatory_field("type"));
                None
            }
            Some(value) => match value.parse::<RecordKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    messages.push(invalid_field("type"));
                    None
                }
            },
        };

        let timestamp = match self.timestamp.as_deref() {
            None => {
                messages.push(mandatory_field("timestamp"));
                None
            }
            Some(value) => {
                let parsed = CallRecord::parse_timestamp(value);
                if parsed.is_none() {
                    messages.push(invalid_field("timestamp"));
                }
                parsed
            }
        };

        if self.call_id.is_none() {
            messages.push(mandatory_field("call_id"));
        }

        if kind == Some(RecordKind::Start) {
            for (field, value) in [("source", &self.source), ("destination", &self.destination)] {
                match value.as_deref() {
                    None => messages.push(mandatory_field(field)),
                    Some(number) if !is_valid_phone_number(number) => {
                        messages.push(invalid_field(field))
                    }
                    Some(_) => {}
                }
            }
        }

        match (kind, timestamp, self.call_id) {
            (Some(kind), Some(timestamp), Some(call_id)) if messages.is_empty() => {
                let mut record = match kind {
                    RecordKind::Start => CallRecord::start(
                        call_id,
                        timestamp,
                        self.source.clone().unwrap_or_default(),
                        self.destination.clone().unwrap_or_default(),
                    ),
                    RecordKind::End => CallRecord::end(call_id, timestamp),
                };
                record.id = self.id;
                Ok(record)
            }
            _ => Err(messages),
        }
    }
}

/// Result of a successful intake
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedResponse {
    /// Number of records stored
    pub processed: usize,
}
