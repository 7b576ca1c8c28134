//! Runtime plumbing for sessionize.
//!
//! * [`connection::CdpConnection`]: request/response correlation and event fan-out
//!   over the hosted browser's CDP WebSocket
//! * [`page::CdpPage`]: a single attached page target with navigation, script
//!   evaluation and network-idle tracking
//! * [`browserbase::BrowserbaseClient`]: REST client for creating and retrieving
//!   remote browser sessions

pub mod browserbase;
pub mod connection;
pub mod error;
pub mod page;

pub use browserbase::BrowserbaseClient;
pub use connection::CdpConnection;
pub use error::{Error, Result};
pub use page::CdpPage;
