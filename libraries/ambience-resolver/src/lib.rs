//! Ambience - Stream Resolution
//!
//! Turns a video page link into a directly playable audio stream URI by
//! running an external helper process (`yt-dlp` by default).
//!
//! # Architecture
//!
//! - [`Resolver`] is the seam the session controller depends on
//! - [`HelperResolver`] implements it with `tokio::process`
//! - Cancellation is explicit: every call takes a [`CancellationToken`] and
//!   the helper child is killed when the token fires or the future is dropped
//!
//! # Example
//!
//! ```rust,no_run
//! use ambience_resolver::{CancellationToken, HelperResolver, Resolver, ResolverConfig};
//!
//! # async fn run() {
//! let resolver = HelperResolver::new(ResolverConfig::default());
//!
//! if resolver.check_available().await {
//!     let token = CancellationToken::new();
//!     match resolver.resolve("https://video/xyz", token).await {
//!         Ok(uri) => println!("stream: {uri}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! # }
//! ```

mod config;
mod error;
mod helper;

pub use config::{ResolverConfig, DEFAULT_FORMAT, DEFAULT_LOCATE_PROGRAM, DEFAULT_PROGRAM};
pub use error::{ResolveError, Result};
pub use helper::HelperResolver;
pub use tokio_util::sync::CancellationToken;

use async_trait::async_trait;

/// Video link resolver
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `locator` to a playable stream URI
    ///
    /// No validation is done on `locator`. Failures are ordinary results:
    /// * `Err(ResolveError::Failed { .. })` - the helper could not produce a URI
    /// * `Err(ResolveError::Cancelled)` - `cancel` fired while in flight
    async fn resolve(&self, locator: &str, cancel: CancellationToken) -> Result<String>;

    /// Whether the external helper exists on this system
    async fn check_available(&self) -> bool;
}
