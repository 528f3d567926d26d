//! HTTP handler contract and built-in pages.
//!
//! - `request`: the descriptor every handler receives
//! - `set`: the four-handler provider contract and its builder
//! - `landing`: the `GET /` page and the declared API route list

pub mod landing;
pub mod request;
pub mod set;

pub use landing::{landing_html, landing_page, ApiRoute, Operation, API_ROUTES};
pub use request::HandlerRequest;
pub use set::{Handler, HandlerSet, HandlerSetBuilder, VideoController};
