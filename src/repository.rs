use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

use crate::dispatch::{dispatch, fan_out};
use crate::errors::{Result, SilenceError};
use crate::labels::LabelSet;
use crate::transport::Transport;
use crate::types::{zero_timestamp, CreateSilenceResponse, Silence, SilencesResponse};

const SILENCES_PATH: &str = "/api/v1/silences";
const SILENCE_PATH: &str = "/api/v1/silence";

/// Build a silence covering `labels` for the next `period_hours` hours
///
/// One exact-match matcher is created per label. `updated_at` is left at the
/// zero timestamp; Alertmanager maintains it.
pub fn build_silence(
    period_hours: u32,
    labels: &LabelSet,
    creator: &str,
    comment: &str,
) -> Silence {
    let starts_at = Utc::now();
    let ends_at = starts_at
        .checked_add_signed(ChronoDuration::hours(i64::from(period_hours)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    Silence {
        id: None,
        status: None,
        matchers: labels.to_matchers(),
        starts_at,
        ends_at,
        updated_at: zero_timestamp(),
        created_by: creator.to_string(),
        comment: comment.to_string(),
    }
}

/// Client for the silences endpoints of one Alertmanager instance
///
/// Every call is bounded by `timeout`, measured separately for each request.
///
/// # Example
///
/// ```rust,no_run
/// use alertmanager_silence::{LabelSet, SilenceRepository, Transport};
/// use url::Url;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repository = SilenceRepository::new(
///         Transport::new()?,
///         Url::parse("http://localhost:9093")?,
///         Duration::from_secs(3),
///     );
///
///     let labels = LabelSet::parse("team=core");
///     for silence in repository.query_active(&labels).await? {
///         println!("{silence}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SilenceRepository {
    transport: Transport,
    base_url: Url,
    timeout: Duration,
}

impl SilenceRepository {
    pub fn new(transport: Transport, base_url: Url, timeout: Duration) -> Self {
        Self {
            transport,
            base_url,
            timeout,
        }
    }

    /// Get the base Alertmanager URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Append an API path to the base URL, keeping any path prefix it has
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn endpoint_url(&self, path: &str) -> Result<Url> {
        let url = self.endpoint(path);
        Url::parse(&url).map_err(|source| SilenceError::InvalidUrl { url, source })
    }

    /// Create a silence
    ///
    /// Returns the ID assigned by Alertmanager when the response carries one.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The silence cannot be serialized
    /// - The request fails or Alertmanager returns a non-200 status
    /// - No response arrives within the timeout ([`SilenceError::Timeout`])
    #[instrument(
        name = "SilenceRepository::create",
        skip_all,
        fields(matchers = silence.matchers.len())
    )]
    pub async fn create(&self, silence: &Silence) -> Result<Option<String>> {
        let body = serde_json::to_string(silence).map_err(SilenceError::Serialize)?;
        let url = self.endpoint_url(SILENCES_PATH)?;
        let transport = self.transport.clone();

        let call = async move { transport.post(url, body).await };
        let response = dispatch(self.timeout, call).await?;

        let silence_id = serde_json::from_str::<CreateSilenceResponse>(&response)
            .ok()
            .and_then(|r| r.data)
            .map(|d| d.silence_id);

        info!(silence_id = ?silence_id, "Silence created");
        Ok(silence_id)
    }

    /// Fetch the active silences matching `filter_labels`
    ///
    /// The filter is applied by Alertmanager as plain label equality; an
    /// empty set returns every silence. Pending and expired silences are
    /// dropped from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out, or the body is not
    /// a valid silences response ([`SilenceError::Parse`]).
    #[instrument(
        name = "SilenceRepository::query_active",
        skip_all,
        fields(filter = %filter_labels.filter_expr())
    )]
    pub async fn query_active(&self, filter_labels: &LabelSet) -> Result<Vec<Silence>> {
        let url = self.endpoint(SILENCES_PATH);
        let filter = filter_labels.filter_expr();
        let transport = self.transport.clone();

        let call = async move { transport.get_filtered(&url, &filter).await };
        let body = dispatch(self.timeout, call).await?;

        let response: SilencesResponse =
            serde_json::from_str(&body).map_err(SilenceError::Parse)?;
        let silences: Vec<Silence> = response
            .into_silences()
            .into_iter()
            .filter(Silence::is_active)
            .collect();

        debug!(active = silences.len(), "Fetched active silences");
        Ok(silences)
    }

    /// Delete every silence in `ids` concurrently
    ///
    /// Each request gets its own timeout. One outcome is returned per ID, in
    /// completion order.
    #[instrument(name = "SilenceRepository::delete_all", skip_all, fields(count = ids.len()))]
    pub async fn delete_all(&self, ids: &[String]) -> Vec<Result<()>> {
        let calls = ids.iter().map(|id| {
            let transport = self.transport.clone();
            let url = self.endpoint_url(&format!("{SILENCE_PATH}/{id}"));
            async move { transport.delete(url?).await }
        });

        fan_out(self.timeout, calls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::parse_labels;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repository(server: &MockServer, timeout: Duration) -> SilenceRepository {
        SilenceRepository::new(
            Transport::new().unwrap(),
            Url::parse(&server.uri()).unwrap(),
            timeout,
        )
    }

    fn remote(id: &str, state: &str) -> serde_json::Value {
        json!({
            "id": id,
            "status": {"state": state},
            "matchers": [{"name": "team", "value": "core", "isRegex": false}],
            "startsAt": "2024-05-01T10:00:00Z",
            "endsAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "createdBy": "bot",
            "comment": "maint"
        })
    }

    #[test]
    fn test_build_silence() {
        let labels = parse_labels("severity=critical,team=core");
        let silence = build_silence(2, &labels, "bot", "maint");

        assert_eq!(silence.matchers.len(), 2);
        assert!(silence
            .matchers
            .iter()
            .any(|m| m.name == "severity" && m.value == "critical"));
        assert!(silence
            .matchers
            .iter()
            .any(|m| m.name == "team" && m.value == "core"));
        assert!(silence.matchers.iter().all(|m| !m.is_regex));
        assert_eq!(silence.ends_at - silence.starts_at, ChronoDuration::hours(2));
        assert_eq!(silence.updated_at, zero_timestamp());
        assert_eq!(silence.created_by, "bot");
        assert_eq!(silence.comment, "maint");
        assert!(silence.id.is_none());
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let repository = SilenceRepository::new(
            Transport::new().unwrap(),
            Url::parse("http://am.example.com/alertmanager/").unwrap(),
            Duration::from_secs(3),
        );
        assert_eq!(
            repository.endpoint(SILENCES_PATH),
            "http://am.example.com/alertmanager/api/v1/silences"
        );
        assert_eq!(
            repository.base_url().as_str(),
            "http://am.example.com/alertmanager/"
        );
        assert_eq!(repository.timeout(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_create_returns_silence_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/silences"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "data": {"silenceId": "new-id"}})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let silence = build_silence(1, &parse_labels("team=core"), "bot", "maint");
        let id = repository(&mock_server, Duration::from_secs(5))
            .create(&silence)
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("new-id"));

        let requests = mock_server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["createdBy"], "bot");
        assert_eq!(sent["matchers"][0]["name"], "team");
        assert_eq!(sent["matchers"][0]["isRegex"], false);
    }

    #[tokio::test]
    async fn test_create_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let silence = build_silence(1, &parse_labels("team=core"), "bot", "maint");
        let result = repository(&mock_server, Duration::from_millis(100))
            .create(&silence)
            .await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_query_active_filters_states() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/silences"))
            .and(query_param("filter", "team=core"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": [
                    remote("a", "active"),
                    remote("b", "expired"),
                    remote("c", "pending"),
                    remote("d", "active")
                ]
            })))
            .mount(&mock_server)
            .await;

        let silences = repository(&mock_server, Duration::from_secs(5))
            .query_active(&parse_labels("team=core"))
            .await
            .unwrap();

        let ids: Vec<&str> = silences.iter().map(Silence::id).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[tokio::test]
    async fn test_query_malformed_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let result = repository(&mock_server, Duration::from_secs(5))
            .query_active(&LabelSet::new())
            .await;
        assert!(matches!(result, Err(SilenceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_delete_all_reports_each_outcome() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/silence/ok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/silence/gone"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcomes = repository(&mock_server, Duration::from_secs(5))
            .delete_all(&["ok".to_string(), "gone".to_string()])
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, Err(SilenceError::Api { status: 500, .. }))));
    }
}
