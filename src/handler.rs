//! Turns a BlobCreated event into a greeting.
//!
//! Everything here is a pure function of the event and the clock, apart from
//! [`handle`] which also writes the greeting to stdout and the log.

use chrono::SecondsFormat;
use log::info;
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::data::EventGridEvent;
use crate::error::HandlerError;

/// Stand-in for a missing blob url and for the file name derived from it.
pub const UNKNOWN: &str = "Unknown";

/// The fields of an event the greeting is made of.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobUpload {
    pub file_name: String,
    pub url: String,
    pub event_time: String,
    pub event_type: String,
    pub subject: String,
}

/// What a handled event leaves behind for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub confirmation: String,
    pub logs: Vec<String>,
}

impl BlobUpload {
    pub fn message(&self) -> String {
        format!(
            "\n🎉 HELLO! New file uploaded to blob storage!\n\n\
             📁 File: {}\n\
             🔗 URL: {}\n\
             ⏰ Time: {}\n\
             📧 Event Type: {}\n\
             📋 Subject: {}\n\n\
             ✅ Event Grid trigger is working perfectly!\n",
            self.file_name, self.url, self.event_time, self.event_type, self.subject
        )
    }

    pub fn log_lines(&self) -> Vec<String> {
        vec![
            format!("🎉 HELLO! File uploaded: {}", self.file_name),
            format!("📁 Blob URL: {}", self.url),
            format!("⏰ Event Time: {}", self.event_time),
        ]
    }

    pub fn confirmation(&self) -> String {
        format!("Hello message printed for blob: {}", self.file_name)
    }
}

/// Everything after the last `/`, or the placeholder for the placeholder url.
pub fn blob_name(url: &str) -> &str {
    if url == UNKNOWN {
        return UNKNOWN;
    }
    url.rsplit('/').next().unwrap_or(url)
}

pub fn describe<C: Clock + ?Sized>(event: &EventGridEvent, clock: &C) -> Result<BlobUpload, HandlerError> {
    let body = body_json(&event.data)?;

    let url = match body.get("url") {
        None => UNKNOWN.to_owned(),
        Some(Value::String(url)) => url.clone(),
        Some(_) => return Err(HandlerError::InvalidField { field: "url", expected: "string" }),
    };
    let event_time = match body.get("eventTime") {
        None => clock.now().to_rfc3339_opts(SecondsFormat::Micros, true),
        Some(time) => display_value(time),
    };

    Ok(BlobUpload {
        file_name: blob_name(&url).to_owned(),
        url,
        event_time,
        event_type: event.event_type.clone(),
        subject: event.subject.clone(),
    })
}

/// Prints the greeting for `event`, logs its key fields and returns the
/// confirmation. Errors are left for the caller to report.
pub fn handle<C: Clock + ?Sized>(event: &EventGridEvent, clock: &C) -> Result<Outcome, HandlerError> {
    let upload = describe(event, clock)?;

    println!("{}", upload.message());
    let logs = upload.log_lines();
    for line in &logs {
        info!("{}", line);
    }

    Ok(Outcome {
        confirmation: upload.confirmation(),
        logs,
    })
}

fn body_json(data: &Value) -> Result<Map<String, Value>, HandlerError> {
    let parsed;
    let body = match data {
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw)?;
            &parsed
        }
        other => other,
    };
    match body {
        Value::Object(map) => Ok(map.clone()),
        _ => Err(HandlerError::BodyNotObject),
    }
}

/// Strings as they are, anything else as its json text.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
