//! Common DTOs used across the API

use serde::Serialize;
use validator::ValidationErrors;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Create a success response with data and message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

/// Message for a required field that is absent
pub fn mandatory_field(field: &str) -> String {
    format!("The field {} is mandatory.", field)
}

/// Message for a field whose value is rejected
pub fn invalid_field(field: &str) -> String {
    format!("The field {} has an invalid value.", field)
}

/// Append the messages of derive-based validation, skipping duplicates
pub fn push_validation_messages(messages: &mut Vec<String>, errors: &ValidationErrors) {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    for (field, field_errors) in fields {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| invalid_field(&field));
            if !messages.contains(&message) {
                messages.push(message);
            }
        }
    }
}
