use bytes::buf::BufExt as _;
use bytes::Buf;
use clap::{crate_version, App, Arg};
use hyper::client::connect::Connect;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client, Method, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use url::Url;

use blob_hello::config::DEFAULT_FUNCTION_NAME;
use blob_hello::data::{EventGridEvent, InvocationRequest, InvocationResponse};
use blob_hello::server::TRIGGER_BINDING;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Sends a synthetic BlobCreated invocation to a running handler.
#[tokio::main]
async fn main() -> Result<()> {
    let matches = App::new("blob-hello client")
        .version(crate_version!())
        .about("Sends a BlobCreated event to a running blob-hello handler")
        .arg(
            Arg::with_name("blob-url")
                .long("blob-url")
                .value_name("URL")
                .help("Url of the uploaded blob")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("event-time")
                .long("event-time")
                .value_name("TIMESTAMP")
                .help("eventTime to put in the event body, omitted when absent")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("target")
                .long("target")
                .value_name("URL")
                .default_value("http://localhost:8080")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("function")
                .long("function")
                .value_name("NAME")
                .default_value(DEFAULT_FUNCTION_NAME)
                .takes_value(true),
        )
        .get_matches();

    let blob_url = Url::parse(matches.value_of("blob-url").unwrap_or_default())?;
    let target = Url::parse(matches.value_of("target").unwrap_or_default())?;
    let function = matches.value_of("function").unwrap_or(DEFAULT_FUNCTION_NAME);
    let uri: Uri = target.join(function)?.as_str().parse()?;

    let event = EventGridEvent::blob_created(&blob_url, matches.value_of("event-time"));
    let invocation = InvocationRequest::for_event(TRIGGER_BINDING, &event)?;

    let https = HttpsConnector::new();
    let client = Client::builder().build::<_, Body>(https);

    let (status, response) = invoke(&client, uri, &invocation).await?;
    println!("status: {}", status);
    if let Some(value) = response.return_value {
        println!("return value: {}", value);
    }
    response.logs.iter().for_each(|line| println!("log: {}", line));

    Ok(())
}

async fn invoke<C>(
    client: &Client<C, Body>,
    uri: Uri,
    invocation: &InvocationRequest,
) -> Result<(StatusCode, InvocationResponse)>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(invocation)?))?;
    let res = client.request(req).await?;
    let status = res.status();
    let body = hyper::body::aggregate(res).await?;
    Ok((status, read_response(body)?))
}

/// Failures without a json reply (such as 404) read as an empty response.
fn read_response<B: Buf>(body: B) -> Result<InvocationResponse> {
    if !body.has_remaining() {
        return Ok(InvocationResponse::default());
    }
    Ok(serde_json::from_reader(body.reader())?)
}
