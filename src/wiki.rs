/// Encyclopedia article lookup.
///
/// This module resolves free-text topics to articles through the MediaWiki Action
/// API, with spelling suggestions, redirect following, and disambiguation
/// detection.
mod client;
mod disambiguation;
mod types;

pub use client::{ArticleFetcher, DEFAULT_API_URL, WikiClient, WikiClientBuilder};
pub use types::{Article, LookupError};
