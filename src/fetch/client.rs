use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends prepared requests. Lets the feed client run over a shared
/// `reqwest::Client` or a wrapper around one.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
