//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **Text processing**: character-based truncation, slugs, terminal-width fitting
//! - **Time formatting**: relative ("3 hours ago") and long-form dates
//! - **Video links**: YouTube id extraction
//! - **Scheduling**: a cancel-and-reschedule [`Debouncer`]
//! - **Sources**: badge styling for known agents
//! - **URL validation**: scheme checks before opening links or calling the API
//!
//! # Examples
//!
//! ```
//! use newsdesk::util::{generate_slug, truncate_text, extract_youtube_id};
//!
//! assert_eq!(generate_slug("Gemini 2.0 Released"), "gemini-2-0-released");
//! assert_eq!(truncate_text("A long description", 6), "A long...");
//! assert_eq!(extract_youtube_id("https://youtu.be/abc").as_deref(), Some("abc"));
//! ```

mod agent;
mod debounce;
mod text;
mod time;
mod url_validator;
mod video;

pub use agent::{agent_badge, source_badge, unique_agents, Badge, Swatch};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use text::{display_width, fit_to_width, generate_slug, sanitize_for_terminal, truncate_text};
pub use time::{article_time, describe_age, format_long, format_relative};
pub use url_validator::{validate_api_url, validate_url_for_open, UrlValidationError};
pub use video::extract_youtube_id;

/// Maximum accepted search query length (characters).
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
