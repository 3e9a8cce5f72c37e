use std::env;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FUNCTION_NAME: &str = "SimpleEventGridTest";

/// Port assigned by the Functions host to its custom handler.
const HOST_PORT_ENV_KEY: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";
const PORT_ENV_KEY: &str = "BLOB_HELLO_PORT";
const FUNCTION_ENV_KEY: &str = "BLOB_HELLO_FUNCTION";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub function_name: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match [HOST_PORT_ENV_KEY, PORT_ENV_KEY]
            .iter()
            .find_map(|key| lookup(*key).map(|value| (*key, value)))
        {
            Some((name, value)) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { name, value, source })?,
            None => DEFAULT_PORT,
        };
        let function_name = lookup(FUNCTION_ENV_KEY)
            .map(|name| name.trim_matches('/').to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_FUNCTION_NAME.to_owned());
        Ok(Config { port, function_name })
    }
}
