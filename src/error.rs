use std::num::ParseIntError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("event body is not valid json: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("event body is not a json object")]
    BodyNotObject,
    #[error("field '{field}' should be a {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("can't read body")]
    UnreadableBody(#[from] hyper::Error),
    #[error("invocation request is not valid json: {0}")]
    MalformedRequest(#[source] serde_json::Error),
    #[error("binding '{0}' is missing from invocation data")]
    MissingBinding(String),
    #[error("binding '{binding}' does not hold an event grid event: {source}")]
    MalformedEvent {
        binding: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} should contain port number, got '{value}'")]
    InvalidPort {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}
