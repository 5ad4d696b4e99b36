use feed_rs::parser;
use futures::stream::StreamExt;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving and parsing a feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// One parsed syndication document.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    pub items: Vec<ParsedItem>,
}

/// One channel item. String fields mirror the source document and may be
/// empty; the ingestor decides what empty means.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Unix seconds parsed from the item's publish date. RSS2 `pubDate`
    /// strings that fail to parse leave this empty rather than failing
    /// the item.
    pub published_at: Option<i64>,
}

/// Fetch and parse one feed document.
///
/// Performs a single GET with a bounded timeout and body size. Retries
/// are not attempted here: the scheduler already marked the feed fetched,
/// so a failing feed simply waits for its next round.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<ParsedFeed, FetchError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    parse_feed(&bytes)
}

fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let title = feed.title.map(|t| t.content).unwrap_or_default();
    let link = feed.links.first().map(|l| l.href.clone());
    let description = feed.description.map(|t| t.content);

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let published_at = entry.published.or(entry.updated).map(|dt| dt.timestamp());
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            ParsedItem {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                link,
                description,
                published_at,
            }
        })
        .collect();

    Ok(ParsedFeed {
        title,
        link,
        description,
        items,
    })
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example Blog</title>
    <link>https://example.com</link>
    <description>Recent posts</description>
    <item>
        <title>First Post</title>
        <link>https://example.com/first</link>
        <description>hello</description>
        <pubDate>Wed, 01 Jan 2020 00:00:00 GMT</pubDate>
    </item>
    <item>
        <title>Second Post</title>
        <link>https://example.com/second</link>
        <description>world</description>
        <pubDate>not-a-date</pubDate>
    </item>
</channel></rss>"#;

    async fn mock_feed(body: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_string(body)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_parses_channel_and_items() {
        let server = mock_feed(VALID_RSS, 200).await;
        let client = reqwest::Client::new();

        let feed = fetch_feed(&client, &format!("{}/feed", server.uri()))
            .await
            .unwrap();

        assert_eq!(feed.title, "Example Blog");
        assert_eq!(feed.link.as_deref(), Some("https://example.com"));
        assert_eq!(feed.description.as_deref(), Some("Recent posts"));
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(first.title, "First Post");
        assert_eq!(first.link, "https://example.com/first");
        assert_eq!(first.description, "hello");
        assert_eq!(first.published_at, Some(1_577_836_800)); // 2020-01-01T00:00:00Z
    }

    #[tokio::test]
    async fn test_unparseable_pub_date_is_absent_not_an_error() {
        let server = mock_feed(VALID_RSS, 200).await;
        let client = reqwest::Client::new();

        let feed = fetch_feed(&client, &format!("{}/feed", server.uri()))
            .await
            .unwrap();

        assert_eq!(feed.items[1].published_at, None);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = mock_feed("gone", 404).await;
        let client = reqwest::Client::new();

        match fetch_feed(&client, &format!("{}/feed", server.uri())).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_xml_is_parse_error() {
        let server = mock_feed("<not valid xml", 200).await;
        let client = reqwest::Client::new();

        match fetch_feed(&client, &format!("{}/feed", server.uri())).await {
            Err(FetchError::Parse(_)) => {}
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_channel_yields_no_items() {
        let empty_rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let server = mock_feed(empty_rss, 200).await;
        let client = reqwest::Client::new();

        let feed = fetch_feed(&client, &format!("{}/feed", server.uri()))
            .await
            .unwrap();
        assert!(feed.items.is_empty());
    }
}
