use std::convert::Infallible;
use std::sync::Arc;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use log::{error, warn};

use crate::clock::Clock;
use crate::data::{EventGridEvent, InvocationRequest, InvocationResponse};
use crate::error::InvocationError;
use crate::handler;

/// Name of the trigger binding in `function.json`.
pub const TRIGGER_BINDING: &str = "event";

/// Serves invocations of one function for the Functions host.
pub struct App<C> {
    function_path: String,
    clock: C,
}

impl<C: Clock> App<C> {
    pub fn new(function_name: &str, clock: C) -> App<C> {
        App {
            function_path: format!("/{}", function_name),
            clock,
        }
    }

    pub async fn routes(self: Arc<Self>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let response = if path == "/" && method == Method::GET {
            Response::new(Body::from("Blob hello operational"))
        } else if path == self.function_path && method == Method::POST {
            self.invoke(req).await
        } else {
            not_found()
        };
        Ok(response)
    }

    async fn invoke(&self, req: Request<Body>) -> Response<Body> {
        let event = match read_event(req).await {
            Ok(event) => event,
            Err(err) => {
                warn!("rejected invocation of {}: {}", self.function_path, err);
                return failure(StatusCode::BAD_REQUEST, err.to_string());
            }
        };
        match handler::handle(&event, &self.clock) {
            Ok(outcome) => json_response(
                StatusCode::OK,
                &InvocationResponse {
                    logs: outcome.logs,
                    return_value: Some(outcome.confirmation),
                    ..Default::default()
                },
            ),
            Err(err) => {
                error!("failed to handle event {} ({}): {}", event.id, event.subject, err);
                failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

async fn read_event(req: Request<Body>) -> Result<EventGridEvent, InvocationError> {
    let body = hyper::body::to_bytes(req.into_body()).await?;
    let invocation: InvocationRequest =
        serde_json::from_slice(&body).map_err(InvocationError::MalformedRequest)?;
    invocation.event(TRIGGER_BINDING)
}

fn not_found() -> Response<Body> {
    with_status(StatusCode::NOT_FOUND, Response::new(Body::empty()))
}

fn failure(status: StatusCode, message: String) -> Response<Body> {
    json_response(
        status,
        &InvocationResponse {
            logs: vec![message],
            ..Default::default()
        },
    )
}

fn json_response(status: StatusCode, body: &InvocationResponse) -> Response<Body> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = with_status(status, Response::new(Body::from(bytes)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => {
            error!("can't serialize invocation response: {}", err);
            with_status(StatusCode::INTERNAL_SERVER_ERROR, Response::new(Body::empty()))
        }
    }
}

fn with_status(status: StatusCode, mut response: Response<Body>) -> Response<Body> {
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::clock::FixedClock;

    fn app() -> Arc<App<FixedClock>> {
        Arc::new(App::new("SimpleEventGridTest", FixedClock(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())))
    }

    fn post(path: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(body.into())
            .unwrap()
    }

    async fn read(response: Response<Body>) -> (StatusCode, InvocationResponse) {
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn photo_invocation(event_time: Option<&str>) -> String {
        let url = Url::parse("https://acct.blob.core.windows.net/container/photo.jpg").unwrap();
        let event = EventGridEvent::blob_created(&url, event_time);
        serde_json::to_string(&InvocationRequest::for_event(TRIGGER_BINDING, &event).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn health_check() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().routes(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invocation_returns_confirmation() {
        let req = post("/SimpleEventGridTest", photo_invocation(Some("2024-01-01T00:00:00Z")));
        let response = app().routes(req).await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.return_value.as_deref(), Some("Hello message printed for blob: photo.jpg"));
        assert_eq!(body.logs.len(), 3);
        assert_eq!(body.logs[2], "⏰ Event Time: 2024-01-01T00:00:00Z");
        assert!(body.outputs.is_empty());
    }

    #[tokio::test]
    async fn invocation_without_event_time_uses_clock() {
        let req = post("/SimpleEventGridTest", photo_invocation(None));
        let (status, body) = read(app().routes(req).await.unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.logs[2], "⏰ Event Time: 2030-01-01T00:00:00.000000Z");
    }

    #[tokio::test]
    async fn malformed_envelope_is_bad_request() {
        let req = post("/SimpleEventGridTest", "not json");
        let (status, body) = read(app().routes(req).await.unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.return_value.is_none());

        let req = post("/SimpleEventGridTest", json!({"Data": {}}).to_string());
        let (status, body) = read(app().routes(req).await.unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.logs[0].contains("'event'"));
    }

    #[tokio::test]
    async fn malformed_event_body_fails_invocation() {
        let invocation = json!({
            "Data": {
                "event": {
                    "subject": "/blobServices/default/containers/container/blobs/photo.jpg",
                    "eventType": "Microsoft.Storage.BlobCreated",
                    "data": "{broken"
                }
            },
            "Metadata": {}
        });
        let req = post("/SimpleEventGridTest", invocation.to_string());
        let (status, body) = read(app().routes(req).await.unwrap()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.return_value.is_none());
        assert!(body.logs[0].starts_with("event body is not valid json"));
    }

    #[tokio::test]
    async fn unknown_routes() {
        let response = app().routes(post("/Other", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let req = Request::builder().uri("/SimpleEventGridTest").body(Body::empty()).unwrap();
        let response = app().routes(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
