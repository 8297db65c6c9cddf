//! HTTP access behind the [`HttpClient`] seam.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};

/// Issues a GET for `url` and returns the body.
///
/// # Errors
///
/// Fails on transport errors and on any non-success status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("{url} returned status {status}");
    }
    Ok(resp.bytes().await?.to_vec())
}
