use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use tracing::{debug, instrument};
use url::Url;

use crate::errors::{Result, SilenceError};

/// Single-request HTTP adapter for the Alertmanager API
///
/// Every non-200 status and every transport failure is surfaced as one
/// [`SilenceError`]. No retries are performed here; timeouts are enforced by
/// the caller (see [`crate::dispatch`]).
#[derive(Clone)]
pub struct Transport {
    client: ClientWithMiddleware,
}

impl Transport {
    /// Create a transport backed by a default reqwest client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(SilenceError::BuildHttpClient)?;

        let client = ClientBuilder::new(client).build();

        Ok(Self { client })
    }

    /// Create a transport with a custom reqwest middleware client
    ///
    /// This allows you to add custom middleware (logging, tracing, etc.)
    pub fn with_client(client: ClientWithMiddleware) -> Self {
        Self { client }
    }

    /// POST a JSON body and return the response body
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not 200.
    #[instrument(name = "Transport::post", skip_all, fields(url = %url))]
    pub async fn post(&self, url: Url, body: String) -> Result<String> {
        debug!(bytes = body.len(), "Sending POST");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(SilenceError::Request)?;

        read_ok_body(response).await
    }

    /// DELETE a resource
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not 200.
    #[instrument(name = "Transport::delete", skip_all, fields(url = %url))]
    pub async fn delete(&self, url: Url) -> Result<()> {
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(SilenceError::Request)?;

        read_ok_body(response).await.map(|_| ())
    }

    /// GET `url`, adding a URL-encoded `filter` query parameter when
    /// `filter_expr` is non-empty
    ///
    /// # Errors
    ///
    /// Returns [`SilenceError::InvalidUrl`] without sending anything if `url`
    /// cannot be parsed. Otherwise fails like [`Transport::post`].
    #[instrument(name = "Transport::get_filtered", skip_all, fields(url = url))]
    pub async fn get_filtered(&self, url: &str, filter_expr: &str) -> Result<String> {
        let mut target = Url::parse(url).map_err(|source| SilenceError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        target.set_query(None);
        if !filter_expr.is_empty() {
            target.query_pairs_mut().append_pair("filter", filter_expr);
        }

        debug!(target = %target, "Sending GET");

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(SilenceError::Request)?;

        read_ok_body(response).await
    }
}

async fn read_ok_body(response: Response) -> Result<String> {
    let status = response.status();

    if status != StatusCode::OK {
        let message = response.text().await.unwrap_or_default();
        return Err(SilenceError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .text()
        .await
        .map_err(|err| SilenceError::Request(err.into()))
}
