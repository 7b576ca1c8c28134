//! Wire types for sessionize.
//!
//! This crate contains the serde-serializable shapes exchanged with the two
//! remote collaborators:
//!
//! - [`cdp`]: Chrome DevTools Protocol envelopes spoken over the hosted browser's
//!   control WebSocket
//! - [`browserbase`]: request/response bodies of the hosted-browser session REST API
//!
//! Types in this crate are pure data. Behavior lives in `sessionize-runtime`.

pub mod browserbase;
pub mod cdp;

pub use browserbase::*;
pub use cdp::*;
