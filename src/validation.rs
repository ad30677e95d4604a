// Validation utilities module
// Local checks are deliberately shallow; required-field rules belong to the external API

use std::borrow::Cow;
use std::collections::BTreeMap;

use validator::{ValidationError, ValidationErrors};

/// Validates email format when one was typed; blank values are left to the external API
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || validator::validate_email(email) {
        Ok(())
    } else {
        let mut error = ValidationError::new("email");
        error.message = Some(Cow::from("The email must be a valid email address."));
        Err(error)
    }
}

/// Flatten validator errors into the same `{field: [messages]}` shape the external API uses
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid.", field.replace('_', " ")),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
