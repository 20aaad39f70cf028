//! Unit test suites that cut across modules (no external services required).

use chrono::{DateTime, TimeZone, Utc};

use crate::models::Post;

mod aggregate_tests;
mod pipeline_tests;

/// Fixed base timestamp for deterministic fixtures.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Build a post fixture with zero engagement.
pub fn make_post(id: &str, author: &str, text: &str, created_at: DateTime<Utc>) -> Post {
    Post {
        id: id.to_string(),
        text: text.to_string(),
        created_at,
        author_id: author.to_string(),
        retweet_count: 0,
        favorite_count: 0,
        is_repost: false,
        has_media: false,
    }
}

/// Build a post fixture with explicit engagement counts.
pub fn make_engaged_post(
    id: &str,
    author: &str,
    text: &str,
    created_at: DateTime<Utc>,
    retweets: u32,
    favorites: u32,
) -> Post {
    Post {
        retweet_count: retweets,
        favorite_count: favorites,
        ..make_post(id, author, text, created_at)
    }
}
