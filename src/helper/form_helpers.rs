use crate::helper::sanitization_helpers::strip_all_html;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use url::form_urlencoded;

pub const DEFAULT_AUTHOR_NAME: &str = "Anonymous";
pub const MAX_NAME_CHARS: usize = 50;
pub const MAX_TEXT_CHARS: usize = 2000;

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<HashMap<String, String>, HttpResponse> {
    let body = match std::str::from_utf8(form_bytes) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

/// Field name to messages, serialized as `{"text": ["..."]}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The cleaned fields of a comment or reply submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackForm {
    pub name: String,
    pub text: String,
}

impl FeedbackForm {
    pub fn validate(fields: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        // Limits apply to what the submitter typed, not to the cleaned value.
        let raw_name = fields.get("name").map(|s| s.trim()).unwrap_or("");
        if raw_name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", format!("Ensure this value has at most {} characters.", MAX_NAME_CHARS));
        }
        let name = strip_all_html(raw_name).trim().to_string();
        let name = if name.is_empty() { DEFAULT_AUTHOR_NAME.to_string() } else { name };

        let raw_text = fields.get("text").map(|s| s.trim()).unwrap_or("");
        if raw_text.is_empty() {
            errors.add("text", "This field is required.");
        } else if raw_text.chars().count() > MAX_TEXT_CHARS {
            errors.add("text", format!("Ensure this value has at most {} characters.", MAX_TEXT_CHARS));
        }

        if errors.is_empty() {
            Ok(FeedbackForm { name, text: raw_text.to_string() })
        } else {
            Err(errors)
        }
    }
}
