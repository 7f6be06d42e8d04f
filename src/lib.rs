//! Client-side core of an AI news reader.
//!
//! Articles are fetched from the news backend ([`remote`]), merged into a
//! local cache ([`storage`]), and exposed through a single state controller
//! ([`app`]) whose filtered view is computed by the pure functions in
//! [`search`].

pub mod app;
pub mod config;
pub mod model;
pub mod remote;
pub mod search;
pub mod storage;
pub mod util;
