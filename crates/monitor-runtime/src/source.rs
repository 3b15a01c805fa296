//! Where snapshots come from.

use async_trait::async_trait;
use monitor_core::error::Result;
use monitor_core::models::ClarificationRecord;
use monitor_data::client::SessionClient;
use monitor_data::extractor::RecordExtractor;

/// A clarification board that can be logged into and read.
#[async_trait]
pub trait ClarificationSource: Send {
    /// Establish (or re-establish) a privileged session.
    async fn login(&mut self) -> Result<()>;

    /// Fetch the board and extract its records in document order.
    async fn fetch_snapshot(&mut self) -> Result<Vec<ClarificationRecord>>;
}

/// The live contest board: an HTTP session plus the HTML extractor.
pub struct BoardSource {
    client: SessionClient,
    extractor: RecordExtractor,
}

impl BoardSource {
    pub fn new(client: SessionClient, extractor: RecordExtractor) -> Self {
        Self { client, extractor }
    }

    /// Pair `client` with an extractor resolving links against its base URL.
    pub fn from_client(client: SessionClient) -> Result<Self> {
        let extractor = RecordExtractor::new(client.base_url())?;
        Ok(Self::new(client, extractor))
    }
}

#[async_trait]
impl ClarificationSource for BoardSource {
    async fn login(&mut self) -> Result<()> {
        self.client.login().await
    }

    async fn fetch_snapshot(&mut self) -> Result<Vec<ClarificationRecord>> {
        let page = self.client.fetch_clarifications_page().await?;
        self.extractor.extract(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::error::MonitorError;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOARD: &str = "<table><tbody>\
        <tr><td>A</td><td>alice</td><td>q1</td><td></td><td>No</td><td></td><td></td>\
        <td><a href=\"/clarifications/reply/1\">Reply</a></td></tr>\
        <tr><td>B</td><td>bob</td><td>q2</td><td>a2</td><td>Yes</td><td></td><td></td>\
        <td><a href=\"/clarifications/reply/2\">Reply</a></td></tr>\
        </tbody></table>";

    async fn source_for(server: &MockServer) -> BoardSource {
        let client =
            SessionClient::new(&server.uri(), "admin", "pw", Duration::from_secs(2)).unwrap();
        BoardSource::from_client(client).unwrap()
    }

    #[tokio::test]
    async fn test_login_and_fetch_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200).append_header("Set-Cookie", "__privilege=owner; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clarifications"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BOARD))
            .mount(&server)
            .await;

        let mut source = source_for(&server).await;
        source.login().await.expect("login");
        let records = source.fetch_snapshot().await.expect("snapshot");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(
            records[0].reply_url,
            format!("{}/clarifications/reply/1", server.uri())
        );
        assert_eq!(records[1].response_text, "a2");
    }

    #[tokio::test]
    async fn test_empty_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clarifications"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut source = source_for(&server).await;
        let err = source.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, MonitorError::Parse(_)));
    }
}
