use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

// Matches the upstream API's own client timeout.
const REQUEST_TIMEOUT_SECS: u64 = 15;
const APP_USER_AGENT: &str = concat!("props-terminal/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(APP_USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}
