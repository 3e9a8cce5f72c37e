use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

use crate::error::InvocationError;

pub const BLOB_CREATED: &str = "Microsoft.Storage.BlobCreated";

/// An Event Grid event as delivered to the trigger binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventGridEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub topic: String,
    pub subject: String,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub data_version: String,
    #[serde(default)]
    pub metadata_version: String,
}

impl EventGridEvent {
    /// Builds a BlobCreated event the way the storage account would emit it
    /// for `blob_url`. `event_time` goes into the body, where the handler reads it.
    pub fn blob_created(blob_url: &Url, event_time: Option<&str>) -> EventGridEvent {
        let mut segments = blob_url
            .path_segments()
            .map(|s| s.filter(|s| !s.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter();
        let container = segments.next().unwrap_or_default();
        let blob_path = segments.collect::<Vec<_>>().join("/");

        let mut data = Map::new();
        data.insert("api".to_owned(), json!("PutBlob"));
        data.insert("blobType".to_owned(), json!("BlockBlob"));
        data.insert("url".to_owned(), json!(blob_url.as_str()));
        if let Some(time) = event_time {
            data.insert("eventTime".to_owned(), json!(time));
        }

        EventGridEvent {
            id: String::new(),
            topic: String::new(),
            subject: format!(
                "/blobServices/default/containers/{}/blobs/{}",
                container, blob_path
            ),
            event_type: BLOB_CREATED.to_owned(),
            event_time: event_time.map(str::to_owned),
            data: Value::Object(data),
            data_version: String::new(),
            metadata_version: "1".to_owned(),
        }
    }
}

/// Request the Functions host POSTs to a custom handler.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "Data", default)]
    pub data: HashMap<String, Value>,
    #[serde(rename = "Metadata", default)]
    pub metadata: HashMap<String, Value>,
}

impl InvocationRequest {
    pub fn for_event(binding: &str, event: &EventGridEvent) -> serde_json::Result<InvocationRequest> {
        let mut data = HashMap::new();
        data.insert(binding.to_owned(), serde_json::to_value(event)?);
        Ok(InvocationRequest { data, metadata: HashMap::new() })
    }

    /// Extracts the event held by `binding`. The host may hand it over either
    /// as an object or as a json encoded string.
    pub fn event(&self, binding: &str) -> Result<EventGridEvent, InvocationError> {
        let value = self
            .data
            .get(binding)
            .ok_or_else(|| InvocationError::MissingBinding(binding.to_owned()))?;
        let parsed = match value {
            Value::String(raw) => serde_json::from_str(raw),
            other => serde_json::from_value(other.clone()),
        };
        parsed.map_err(|source| InvocationError::MalformedEvent {
            binding: binding.to_owned(),
            source,
        })
    }
}

/// Response a custom handler sends back to the Functions host.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "Outputs", default)]
    pub outputs: HashMap<String, Value>,
    #[serde(rename = "Logs", default)]
    pub logs: Vec<String>,
    #[serde(rename = "ReturnValue", default)]
    pub return_value: Option<String>,
}
