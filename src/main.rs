use std::env;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use log::info;

use blob_hello::clock::SystemClock;
use blob_hello::config::Config;
use blob_hello::server::App;

const LOG_ENV_KEY: &str = "RUST_LOG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if env::var(LOG_ENV_KEY).is_err() {
        env::set_var(LOG_ENV_KEY, "info");
    }
    pretty_env_logger::init();

    let config = Config::from_env()?;
    let app = Arc::new(App::new(&config.function_name, SystemClock));
    let addr = ([0, 0, 0, 0], config.port).into();
    let service = make_service_fn(move |_| {
        let app = app.clone();
        async move { Ok::<_, hyper::Error>(service_fn(move |req| app.clone().routes(req))) }
    });
    let server = Server::bind(&addr).serve(service);
    info!("Listening on http://{} for /{}", addr, config.function_name);
    server.await?;
    Ok(())
}
