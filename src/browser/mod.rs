//! Browser session management and navigation
//!
//! - [`session`]: launching a local Chrome/Chromium or attaching to a remote
//!   debugging endpoint, with ownership-aware teardown
//! - [`navigate`]: click-simulated navigation that avoids the direct `goto`
//!   automation fingerprint

pub mod navigate;
pub mod session;

pub use session::{BrowserSession, TeardownAction};
