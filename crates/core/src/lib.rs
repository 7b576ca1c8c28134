//! sessionize: organizer automation for Sessionize over a hosted remote browser.
//!
//! The crate drives the organizer evaluation workflow (reading submissions,
//! applying ratings, leaving comments, advancing through the queue) through a
//! Browserbase session reached over the Chrome DevTools Protocol.
//!
//! # Layers
//!
//! * [`remote`]: remote session lifecycle with reuse across invocations
//! * [`auth`]: login detection and the classic email/password login flow
//! * [`scraper`]: page scripts and text extraction for sessions and speakers
//! * [`commands`]: complete command flows returning serializable payloads
//! * [`state`]: the small JSON state file shared by consecutive invocations
//!
//! Everything above the driver works against [`PageLike`], so flows can be
//! exercised with [`testing::MockPage`] instead of a real browser.
//!
//! ```ignore
//! use std::sync::Arc;
//! use sessionize::{CdpDriver, CommandContext, Options, StateStore};
//! use sessionize::commands::session;
//! use sessionize_runtime::BrowserbaseClient;
//!
//! let options = Options { api_key: Some(key.clone()), ..Default::default() };
//! let ctx = CommandContext::new(
//!     options,
//!     StateStore::from_env(),
//!     Arc::new(BrowserbaseClient::new(key)?),
//!     Arc::new(CdpDriver),
//! );
//! let payload = session::show(&ctx).await?;
//! ```

pub mod auth;
pub mod commands;
pub mod error;
pub mod options;
pub mod page;
pub mod remote;
pub mod retry;
pub mod scraper;
pub mod selector;
pub mod state;
pub mod target;
pub mod testing;

pub use auth::{Credentials, LoginOutcome};
pub use commands::CommandContext;
pub use error::{Error, ErrorKind, Result};
pub use options::{Options, mask_secret};
pub use page::{PageLike, Script};
pub use remote::{BrowserDriver, CdpDriver, Connected, RemoteSession, SessionManager, SessionProvider};
pub use retry::RetryPolicy;
pub use state::{PersistedState, StatePatch, StateStore};
pub use target::EvaluationTarget;
