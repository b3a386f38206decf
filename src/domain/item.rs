use serde::{Deserialize, Serialize};

/// Base for permalink-to-URL expansion.
pub const SITE_BASE: &str = "https://www.reddit.com";

/// Comment bodies are trimmed to this many characters for display.
pub const EXCERPT_LEN: usize = 80;

/// A single piece of new activity pulled from the platform.
///
/// Items are immutable once constructed; the discriminant is matched
/// exhaustively wherever items are consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamItem {
    Post {
        channel: String,
        title: String,
        permalink: String,
    },
    Comment {
        channel: String,
        body: String,
        permalink: String,
    },
}

impl StreamItem {
    pub fn channel(&self) -> &str {
        match self {
            StreamItem::Post { channel, .. } | StreamItem::Comment { channel, .. } => channel,
        }
    }

    pub fn permalink(&self) -> &str {
        match self {
            StreamItem::Post { permalink, .. } | StreamItem::Comment { permalink, .. } => permalink,
        }
    }

    /// Absolute URL for the item, site base joined with the permalink.
    pub fn url(&self) -> String {
        match url::Url::parse(SITE_BASE).and_then(|base| base.join(self.permalink())) {
            Ok(u) => u.to_string(),
            Err(_) => format!("{}{}", SITE_BASE, self.permalink()),
        }
    }

    /// One-line summary: post title, or the first 80 characters of a
    /// comment body followed by "...".
    pub fn summary(&self) -> String {
        match self {
            StreamItem::Post { title, .. } => title.clone(),
            StreamItem::Comment { body, .. } => {
                let excerpt: String = body.chars().take(EXCERPT_LEN).collect();
                format!("{}...", excerpt)
            }
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            StreamItem::Post { .. } => "Post",
            StreamItem::Comment { .. } => "Comment",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str) -> StreamItem {
        StreamItem::Post {
            channel: "learnpython".into(),
            title: title.into(),
            permalink: "/r/learnpython/comments/abc123/title/".into(),
        }
    }

    fn comment(body: &str) -> StreamItem {
        StreamItem::Comment {
            channel: "smallbusiness".into(),
            body: body.into(),
            permalink: "/r/smallbusiness/comments/abc123/title/def456/".into(),
        }
    }

    #[test]
    fn test_url_joins_site_base_with_permalink() {
        assert_eq!(
            post("hi").url(),
            "https://www.reddit.com/r/learnpython/comments/abc123/title/"
        );
    }

    #[test]
    fn test_post_summary_is_title() {
        assert_eq!(
            post("A very good question").summary(),
            "A very good question"
        );
    }

    #[test]
    fn test_comment_summary_truncates_to_80_chars() {
        let body = "x".repeat(200);
        let summary = comment(&body).summary();
        assert_eq!(summary.len(), EXCERPT_LEN + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_short_comment_still_gets_ellipsis() {
        assert_eq!(comment("short").summary(), "short...");
    }

    #[test]
    fn test_comment_excerpt_counts_chars_not_bytes() {
        let body = "é".repeat(100);
        let summary = comment(&body).summary();
        assert_eq!(summary.chars().count(), EXCERPT_LEN + 3);
    }

    #[test]
    fn test_channel_accessor() {
        assert_eq!(post("t").channel(), "learnpython");
        assert_eq!(comment("b").channel(), "smallbusiness");
    }
}
