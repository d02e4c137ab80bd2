//! # Wiki Core
//!
//! Client-side core of the personal wiki viewer.
//!
//! This crate contains the viewer state and the logic that derives what is drawn from it:
//! - A keyed content store merged from list, detail and search responses
//! - Tree navigation where expansion is derived from one active path
//! - Debounced, race-safe search with query-term highlighting
//! - Placeholder substitution and HTML sanitisation for content bodies
//! - The content API contract, over HTTP or answered from a local content bundle
//!
//! **No rendering concerns**: drawing the tree, panes and marks belongs to the front ends
//! (`cli`) and serving content belongs to `api-rest`.

pub mod api;
pub mod bundle;
pub mod config;
pub mod constants;
pub mod error;
pub mod highlight;
pub mod navigator;
pub mod sanitize;
pub mod search;
pub mod store;
pub mod template;
pub mod view;
pub mod viewer;

pub use api::{ContentApi, HttpContentApi, StaticContentApi};
pub use bundle::ContentBundle;
pub use config::ViewerConfig;
pub use error::{WikiError, WikiResult};
pub use navigator::{NavigationPath, TreeNavigator, TreeRow};
pub use store::ContentStore;
pub use viewer::{Panel, Viewer, ViewerEvent};
