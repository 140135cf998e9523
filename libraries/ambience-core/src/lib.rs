//! Ambience Core
//!
//! Shared domain types and the settings access interface for Ambience.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Entry`, `EntryId`, `SourceKind`
//! - **Settings Access**: the `SettingsStore` trait plus in-memory and
//!   JSON-file implementations
//! - **Error Handling**: `CoreError` and a `Result` alias
//!
//! # Example
//!
//! ```rust
//! use ambience_core::{Entry, EntryId, MemorySettings, SettingsStore, SourceKind};
//!
//! let rain = Entry::new(1, "Rain", SourceKind::LocalFile, "/tmp/rain.ogg");
//! let settings = MemorySettings::new(vec![rain.clone()]);
//!
//! settings.set_last_played(rain.id).unwrap();
//! assert_eq!(settings.last_played().unwrap(), Some(EntryId::new(1)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod settings;
pub mod types;

pub use error::{CoreError, Result};
pub use settings::{JsonFileSettings, MemorySettings, SettingsStore};
pub use types::{Entry, EntryId, SourceKind};
