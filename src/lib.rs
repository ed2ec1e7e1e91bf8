//! Async Rust client for the iRacing telemetry SDK.
//!
//! The simulator publishes telemetry through a named shared-memory region
//! plus a kernel event that fires on every completed tick. This crate
//! attaches to that region, decodes its self-describing layout, and
//! exposes:
//!
//! - **Per-tick variables**: a lazily built catalog with typed scalar and
//!   array access, backed by a tear-free snapshot protocol over the
//!   simulator's rotating buffers
//! - **Session metadata**: per-key cached access to the embedded session
//!   document, with the normalization the simulator's quasi-YAML needs
//! - **Control commands**: the broadcast window-message surface (pit
//!   commands, camera and replay control, chat, FFB, telemetry recording)
//! - **Recordings**: cross-platform random access over recorded session
//!   files, which share the live binary layout
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use raceline::Client;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> raceline::Result<()> {
//!     let mut client = Client::new();
//!     if client.startup(None, None).await? {
//!         client.freeze_var_buffer_latest().await?;
//!         if let Some(speed) = client.get("Speed").await? {
//!             println!("Speed: {:?}", speed);
//!         }
//!         client.unfreeze_var_buffer_latest();
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Live telemetry requires Windows; recordings and test-file attachments
//! work on any platform.

pub mod binary;
pub mod broadcast;
mod client;
mod error;
pub mod layout;
pub mod probe;
mod session;
mod source;
pub mod test_utils;
pub mod types;

// Data source modules
pub mod ibt;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

// Core exports
pub use client::{Client, ClientValue, DATA_VALID_TIMEOUT};
pub use error::{Result, SdkError};
pub use session::{SessionValue, normalize_section};
pub use types::*;

// Data source exports
pub use ibt::{DiskInfo, IbtReader};

// Probe exports
pub use probe::{HttpSimStatus, SimStatus};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
