//! Reddit-backed item sources.
//!
//! Authenticates with the password grant, then polls the `new` and
//! `comments` listings of the joined channel set with a `before` anchor so
//! only unseen items are returned. The first fetch of each listing only
//! records the current newest item, mirroring a skip-existing stream.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::app::{Result, WatchError};
use crate::config::Credentials;
use crate::domain::StreamItem;
use crate::source::{Connector, ItemSource, SourcePair};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Minimum spacing between HTTP polls of one listing. An empty buffer
/// inside the spacing window reports the empty-poll sentinel instead of
/// hitting the network.
const FETCH_SPACING: Duration = Duration::from_secs(2);

/// Items requested per listing fetch.
const PAGE_LIMIT: u32 = 100;

pub struct RedditConnector {
    credentials: Credentials,
    client: Client,
}

impl RedditConnector {
    pub fn new(credentials: Credentials) -> Self {
        let user_agent = if credentials.user_agent.is_empty() {
            concat!("redwatch/", env!("CARGO_PKG_VERSION")).to_string()
        } else {
            credentials.user_agent.clone()
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            credentials,
            client,
        }
    }

    async fn authenticate(&self) -> Result<String> {
        info!("Authenticating with Reddit...");

        let params = [
            ("grant_type", "password"),
            ("username", &self.credentials.username),
            ("password", &self.credentials.password),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(WatchError::Auth(format!(
                "token endpoint rejected the app credentials ({status})"
            )));
        }
        let response = response.error_for_status()?;

        // Reddit reports bad user credentials as 200 + {"error": "..."}.
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| WatchError::Malformed(format!("token response: {e}")))?;

        match (token.access_token, token.error) {
            (_, Some(error)) => Err(WatchError::Auth(format!(
                "credentials rejected: {error}"
            ))),
            (Some(access_token), None) => {
                info!("Authentication successful");
                Ok(access_token)
            }
            (None, None) => Err(WatchError::Malformed(
                "token response had neither a token nor an error".into(),
            )),
        }
    }
}

#[async_trait]
impl Connector for RedditConnector {
    fn validate(&self) -> Result<()> {
        self.credentials.validate()
    }

    async fn open(&self, channels: &[String]) -> Result<SourcePair> {
        let token = self.authenticate().await?;

        let joined = channels
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("+");
        if joined.is_empty() {
            return Err(WatchError::Config("no channels configured".into()));
        }

        info!(channels = %joined, "Opening submission and comment streams");

        let submissions = ListingSource::new(
            self.client.clone(),
            token.clone(),
            ListingKind::Submissions,
            joined.clone(),
        );
        let comments = ListingSource::new(self.client.clone(), token, ListingKind::Comments, joined);

        Ok((Box::new(submissions), Box::new(comments)))
    }
}

#[derive(Debug, Clone, Copy)]
enum ListingKind {
    Submissions,
    Comments,
}

impl ListingKind {
    fn url(self, channels: &str) -> String {
        match self {
            ListingKind::Submissions => format!("{API_BASE}/r/{channels}/new"),
            ListingKind::Comments => format!("{API_BASE}/r/{channels}/comments"),
        }
    }
}

/// One polled Reddit listing. Fetched pages are buffered and handed out
/// one item per `poll` call, oldest first.
struct ListingSource {
    client: Client,
    token: String,
    kind: ListingKind,
    channels: String,
    /// Fullname of the newest item seen; listing fetches return only
    /// items newer than this anchor.
    before: Option<String>,
    /// True until the first fetch has recorded the current newest item.
    primed: bool,
    buffer: VecDeque<StreamItem>,
    next_fetch: Instant,
}

impl ListingSource {
    fn new(client: Client, token: String, kind: ListingKind, channels: String) -> Self {
        Self {
            client,
            token,
            kind,
            channels,
            before: None,
            primed: false,
            buffer: VecDeque::new(),
            next_fetch: Instant::now(),
        }
    }

    async fn fetch(&mut self) -> Result<()> {
        self.next_fetch = Instant::now() + FETCH_SPACING;

        let mut request = self
            .client
            .get(self.kind.url(&self.channels))
            .bearer_auth(&self.token)
            .query(&[("limit", PAGE_LIMIT.to_string())]);
        if let Some(before) = &self.before {
            request = request.query(&[("before", before.as_str())]);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(WatchError::Auth(
                    "listing request rejected, token invalid or expired".into(),
                ));
            }
            StatusCode::FORBIDDEN => {
                return Err(WatchError::Access(format!(
                    "channels \"{}\" are forbidden or private",
                    self.channels
                )));
            }
            StatusCode::NOT_FOUND => {
                return Err(WatchError::Access(format!(
                    "channels \"{}\" do not exist",
                    self.channels
                )));
            }
            _ => {}
        }
        let response = response.error_for_status()?;

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| WatchError::Malformed(format!("listing response: {e}")))?;

        // Newest first in the payload; anchor on the newest.
        let children = listing.data.children;
        if let Some(newest) = children.first() {
            self.before = Some(newest.data.name.clone());
        }

        if !self.primed {
            // Skip everything that existed before the session started.
            self.primed = true;
            debug!(
                kind = ?self.kind,
                skipped = children.len(),
                "listing primed"
            );
            return Ok(());
        }

        // Reversed so the buffer drains oldest first.
        for thing in children.into_iter().rev() {
            self.buffer.push_back(thing.data.into_item(self.kind));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemSource for ListingSource {
    async fn poll(&mut self) -> Result<Option<StreamItem>> {
        if let Some(item) = self.buffer.pop_front() {
            return Ok(Some(item));
        }
        if Instant::now() < self.next_fetch {
            return Ok(None);
        }
        self.fetch().await?;
        Ok(self.buffer.pop_front())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    data: ThingData,
}

#[derive(Deserialize)]
struct ThingData {
    name: String,
    subreddit: String,
    permalink: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

impl ThingData {
    fn into_item(self, kind: ListingKind) -> StreamItem {
        let decode = |s: String| html_escape::decode_html_entities(&s).to_string();
        match kind {
            ListingKind::Submissions => StreamItem::Post {
                channel: self.subreddit,
                title: decode(self.title.unwrap_or_default()),
                permalink: self.permalink,
            },
            ListingKind::Comments => StreamItem::Comment {
                channel: self.subreddit,
                body: decode(self.body.unwrap_or_default()),
                permalink: self.permalink,
            },
        }
    }
}
