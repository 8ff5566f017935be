//! X API v2 recent search wire types

use serde::{Deserialize, Serialize};

use crate::model::SocialSignal;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<Tweet> for SocialSignal {
    fn from(tweet: Tweet) -> Self {
        SocialSignal {
            id: tweet.id,
            text: tweet.text,
            created_at: tweet.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMeta {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub newest_id: Option<String>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// `GET /tweets/search/recent` body; `data` is absent when nothing matched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSearchResponse {
    #[serde(default)]
    pub data: Vec<Tweet>,
    #[serde(default)]
    pub meta: Option<SearchMeta>,
}
