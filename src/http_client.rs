use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static CLIENT: OnceCell<Client> = OnceCell::new();

fn request_timeout() -> Duration {
    let secs = std::env::var("VBDB_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(REQUEST_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}

pub fn get_text(url: &str) -> Result<String> {
    debug!(%url, "GET");
    let resp = http_client()?
        .get(url)
        .send()
        .with_context(|| format!("request {url}"))?
        .error_for_status()
        .with_context(|| format!("bad status from {url}"))?;
    resp.text().with_context(|| format!("read body from {url}"))
}

pub fn get_json(url: &str) -> Result<Value> {
    get_json_with(url, &[])
}

pub fn get_json_with(url: &str, query: &[(&str, &str)]) -> Result<Value> {
    debug!(%url, "GET json");
    let resp = http_client()?
        .get(url)
        .query(query)
        .send()
        .with_context(|| format!("request {url}"))?
        .error_for_status()
        .with_context(|| format!("bad status from {url}"))?;
    resp.json::<Value>()
        .with_context(|| format!("parse json from {url}"))
}
