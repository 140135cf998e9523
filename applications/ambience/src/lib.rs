//! Ambience
//!
//! Terminal front end for the ambient sound session: configuration, the
//! notification renderer and the interactive command loop.
//!
//! This library exposes the core components for testing purposes.

pub mod commands;
pub mod config;
pub mod error;
pub mod renderer;

pub use commands::{run_interactive, UserCommand};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use renderer::{spawn_renderer, Renderer, TerminalRenderer};
