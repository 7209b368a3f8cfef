use std::time::Duration;

use fancy_regex::Regex;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Chapter markers as they commonly appear in discussion post titles,
/// e.g. "Ch. 80", "chapter 80.5" or "c80".
static CHAPTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bch?(?:apter)?\.?\s*(\d+(?:\.\d+)?)\b").expect("chapter regex")
});

#[derive(Debug, Clone, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Clone, Deserialize)]
struct Thing {
    data: Post,
}

/// A single post from a search listing. Everything except the title is
/// optional on the wire, missing fields never fail the whole response.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Post {
    pub title: String,
    pub permalink: String,
    pub url: String,
    pub link_flair_text: Option<String>,
    pub created_utc: f64,
}

impl Post {
    /// The canonical URL of the post itself, used as the dedup key.
    /// Relative permalinks always resolve against the public host, not the
    /// host the listing was fetched from, so the same post yields the same
    /// key whether it arrived through the public or an oauth endpoint.
    /// Posts without one cannot be deduped or cited and are skipped.
    pub fn source_url(&self) -> Option<String> {
        if !self.permalink.is_empty() {
            if self.permalink.starts_with('/') {
                return Some(format!("{DEFAULT_BASE_URL}{}", self.permalink));
            }
            return Some(self.permalink.clone());
        }
        if !self.url.is_empty() {
            return Some(self.url.clone());
        }
        None
    }

    /// Best-effort chapter marker from the post title. Free text, not
    /// guaranteed numeric or monotonic.
    pub fn chapter_label(&self) -> Option<String> {
        CHAPTER_RE
            .captures(&self.title)
            .ok()
            .flatten()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Search client for the discussion board. Every request carries the fixed
/// client identifier header required by the provider's API rules.
#[derive(Debug, Clone)]
pub struct RedditClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    board: String,
    flair: String,
    access_token: Option<String>,
}

impl RedditClient {
    pub fn new(
        base_url: &str,
        board: &str,
        flair: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            board: board.to_string(),
            flair: flair.to_string(),
            access_token: None,
        })
    }

    /// Bearer credential attached to subsequent requests. Not mutated while
    /// a polling cycle is in flight.
    pub fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    /// Searches the board for posts matching `query`, newest first. The board
    /// and flair qualifiers are appended so results stay scoped to the
    /// discussion flair regardless of the query text.
    pub async fn search(&self, query: &str) -> Result<Vec<Post>, Error> {
        let q = format!("{query} subreddit:{} flair:{}", self.board, self.flair);

        let mut request = self
            .http
            .get(format!("{}/search.json", self.base_url))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("q", q.as_str()), ("sort", "new"), ("t", "all")]);

        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let listing: Listing = read_json(response).await?;

        Ok(listing.data.children.into_iter().map(|t| t.data).collect())
    }
}

/// Uniform response handling for every endpoint this client talks to:
/// non-success status, empty body and unparseable body each map to their own
/// failure instead of a silent `None`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();
    if status.as_u16() >= 300 {
        return Err(Error::Rejected {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        });
    }

    let body = response.text().await?;
    if body.is_empty() {
        return Err(Error::EmptyResponse);
    }

    debug!("response body: {body}");

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> RedditClient {
        RedditClient::new(base_url, "manga", "DISC", "test-agent", Duration::from_secs(10))
            .unwrap()
    }

    fn listing_body() -> &'static str {
        r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t3",
                        "data": {
                            "title": "Spy x Family - Ch. 80",
                            "permalink": "/r/manga/comments/abc/spy_x_family_ch_80/",
                            "url": "https://example.com/spy/80",
                            "link_flair_text": "DISC",
                            "created_utc": 1700000000.0
                        }
                    },
                    {
                        "kind": "t3",
                        "data": {
                            "title": "Some other post"
                        }
                    }
                ]
            }
        }"#
    }

    #[tokio::test]
    async fn search_parses_listing_and_tolerates_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "spy x family subreddit:manga flair:DISC"))
            .and(query_param("sort", "new"))
            .and(query_param("t", "all"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(listing_body(), "application/json"),
            )
            .mount(&server)
            .await;

        let posts = client(&server.uri()).search("spy x family").await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "Spy x Family - Ch. 80");
        assert_eq!(posts[0].link_flair_text.as_deref(), Some("DISC"));
        // second post has no permalink, url or flair, it still parses
        assert_eq!(posts[1].title, "Some other post");
        assert!(posts[1].link_flair_text.is_none());
        assert!(posts[1].source_url().is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_rejected_without_body_parsing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("not json at all"))
            .mount(&server)
            .await;

        let result = client(&server.uri()).search("anything").await;

        match result {
            Err(Error::Rejected { status, reason }) => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_is_its_own_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = client(&server.uri()).search("anything").await;

        assert!(matches!(result, Err(Error::EmptyResponse)));
    }

    #[tokio::test]
    async fn unparseable_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&server)
            .await;

        let result = client(&server.uri()).search("anything").await;

        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn connection_error_maps_to_transport() {
        // nothing is listening on this port
        let result = client("http://127.0.0.1:9").search("anything").await;

        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn source_url_prefers_the_permalink() {
        let post = Post {
            permalink: "/r/manga/comments/abc/post/".to_string(),
            url: "https://example.com/external".to_string(),
            ..Default::default()
        };

        assert_eq!(
            post.source_url().as_deref(),
            Some("https://www.reddit.com/r/manga/comments/abc/post/")
        );
    }

    #[test]
    fn source_url_falls_back_to_the_link() {
        let post = Post {
            url: "https://example.com/external".to_string(),
            ..Default::default()
        };

        assert_eq!(post.source_url().as_deref(), Some("https://example.com/external"));
    }

    #[test]
    fn chapter_label_extraction() {
        let cases = [
            ("Spy x Family - Ch. 80", Some("80")),
            ("Frieren Chapter 112.5 discussion", Some("112.5")),
            ("Oshi no Ko c155", Some("155")),
            ("One-shot announcement", None),
        ];

        for (title, expected) in cases {
            let post = Post {
                title: title.to_string(),
                ..Default::default()
            };
            assert_eq!(post.chapter_label().as_deref(), expected, "title: {title}");
        }
    }
}
