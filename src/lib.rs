//! # product-scout
//!
//! A Rust library and CLI for scraping a single dynamically-rendered product
//! page through a real Chrome/Chromium instance driven over the Chrome
//! DevTools Protocol (CDP).
//!
//! ## Features
//!
//! - **Session management**: launch a local browser or attach to a remote
//!   debugging endpoint (explicit WebSocket URL, or resolved from a
//!   debugging port via `/json/version`); teardown respects ownership, so an
//!   attached browser is never closed
//! - **Click-simulated navigation**: pages are reached by clicking a
//!   synthesized link from a blank launchpad document instead of a scripted
//!   `goto`, reducing the automation fingerprint
//! - **Challenge recovery**: anti-bot interstitials are detected from the
//!   page title; in headful mode the operator gets one manual-resolution
//!   cycle before the run fails
//! - **Structured extraction**: Schema.org `Product` and `BreadcrumbList`
//!   JSON-LD with DOM fallbacks, normalized into a [`ProductRecord`] where
//!   every field is independently optional
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use product_scout::{RunConfig, Scenario, scenario};
//!
//! # fn main() -> product_scout::Result<()> {
//! let config = RunConfig {
//!     url: Some("https://www.ozon.ru/product/example-123/".to_string()),
//!     scenario: Scenario::FullParse,
//!     ..Default::default()
//! };
//!
//! let record = scenario::run(&config)?;
//! println!("{}: {:?} {:?}", record.title, record.price.value, record.price.currency);
//! # Ok(())
//! # }
//! ```
//!
//! ## Attaching to an antidetect-profile browser
//!
//! External profile tooling usually exposes a remote debugging endpoint or
//! port; hand either to [`RunConfig::connect_endpoint`] /
//! [`RunConfig::connect_port`] and the session attaches instead of
//! launching. Attached sessions are disconnected, never closed.
//!
//! ## Module Overview
//!
//! - [`browser`]: session acquisition and click-simulated navigation
//! - [`challenge`]: anti-bot challenge state machine
//! - [`extract`]: page snapshot capture, JSON-LD parsing, record assembly
//! - [`scenario`]: named end-to-end flows and teardown policy
//! - [`config`]: run configuration and validation
//! - [`output`]: JSON / human-readable rendering
//! - [`error`]: error types and the crate [`Result`] alias

pub mod browser;
pub mod challenge;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod scenario;

pub use browser::{BrowserSession, TeardownAction};
pub use challenge::{ChallengeHandler, ChallengeState};
pub use config::{OutputFormat, RunConfig, Scenario};
pub use error::{Result, ScoutError};
pub use extract::{PageSnapshot, PriceInfo, ProductRecord, RatingInfo};
