//! Constants used throughout the wiki core crate.
//!
//! Defaults for configuration and the fixed limits of the sidebar tree live here so that the
//! binaries and the tests agree on them.

use std::time::Duration;

/// Quiet period after the last keystroke before a search request is issued.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default content API base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Default per-request timeout for the HTTP content API.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Rows at this depth or deeper never materialise their connections.
///
/// Depth is zero-based, so the rendered tree has at most three levels.
pub const MAX_EXPANSION_DEPTH: usize = 2;

/// URL substituted for image sources with a disallowed scheme.
pub const BLANK_URL: &str = "about:blank";

/// Environment variable holding the content API base URL.
pub const API_URL_ENV: &str = "WIKI_API_URL";

/// Environment variable holding the search debounce in milliseconds.
pub const SEARCH_DEBOUNCE_ENV: &str = "WIKI_SEARCH_DEBOUNCE_MS";

/// Environment variable holding the request timeout in milliseconds.
pub const REQUEST_TIMEOUT_ENV: &str = "WIKI_REQUEST_TIMEOUT_MS";

/// Environment variable holding the content server listen address.
pub const REST_ADDR_ENV: &str = "WIKI_REST_ADDR";

/// Default content server listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Environment variable holding the content bundle served by the content server.
pub const CONTENT_FILE_ENV: &str = "WIKI_CONTENT_FILE";

/// Default content bundle path, relative to the working directory.
pub const DEFAULT_CONTENT_FILE: &str = "content.json";
