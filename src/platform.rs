//! Per-platform publishing limits and copywriting guidance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

/// Social networks content can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Linkedin,
    Instagram,
    Facebook,
    Tiktok,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Instagram,
        Platform::Facebook,
        Platform::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Tiktok => "tiktok",
        }
    }

    pub fn spec(&self) -> &'static PlatformSpec {
        match self {
            Platform::Twitter => &TWITTER,
            Platform::Linkedin => &LINKEDIN,
            Platform::Instagram => &INSTAGRAM,
            Platform::Facebook => &FACEBOOK,
            Platform::Tiktok => &TIKTOK,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Static publishing constraints for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpec {
    pub platform: Platform,
    /// Hard character limit enforced by the network
    pub max_length: usize,
    /// Length the prompt asks the model to aim for
    pub optimal_length: usize,
    pub hashtag_limit: usize,
    pub guidance: &'static str,
}

impl PlatformSpec {
    /// Look up a spec by its raw platform key
    pub fn for_key(key: &str) -> Result<&'static PlatformSpec, UnknownPlatform> {
        key.parse::<Platform>().map(|p| p.spec())
    }
}

static TWITTER: PlatformSpec = PlatformSpec {
    platform: Platform::Twitter,
    max_length: 280,
    optimal_length: 200,
    hashtag_limit: 3,
    guidance: "Lead with a sharp hook, keep to a single idea, and use conversational, punchy phrasing. Hashtags sparingly at the end.",
};

static LINKEDIN: PlatformSpec = PlatformSpec {
    platform: Platform::Linkedin,
    max_length: 3000,
    optimal_length: 1300,
    hashtag_limit: 5,
    guidance: "Open with an insight or question, use short paragraphs with line breaks, share practical expertise, and close with a call for discussion.",
};

static INSTAGRAM: PlatformSpec = PlatformSpec {
    platform: Platform::Instagram,
    max_length: 2200,
    optimal_length: 1000,
    hashtag_limit: 30,
    guidance: "Write a visual, story-driven caption. Put the key message in the first line, use emojis where natural, and group hashtags at the end.",
};

static FACEBOOK: PlatformSpec = PlatformSpec {
    platform: Platform::Facebook,
    max_length: 63206,
    optimal_length: 250,
    hashtag_limit: 3,
    guidance: "Keep it friendly and community-focused, ask a question to invite comments, and keep hashtags minimal.",
};

static TIKTOK: PlatformSpec = PlatformSpec {
    platform: Platform::Tiktok,
    max_length: 2200,
    optimal_length: 300,
    hashtag_limit: 5,
    guidance: "Write an energetic caption that complements short-form video, reference trends where relevant, and include a clear call to action.",
};
