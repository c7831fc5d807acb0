//! Value debouncing for high-frequency producers
//!
//! This crate provides:
//! - [`Debouncer`]: commits a value only after it has been stable for a delay
//! - [`KeyedDebouncer`]: independent per-key debouncing (per-path timers)
//! - [`Scheduler`] seam with tokio-backed and manual (virtual clock) timers
//! - [`DebounceConfig`]: TOML configuration with validation
//!
//! ```no_run
//! # async fn demo() -> debounce::Result<()> {
//! use std::time::Duration;
//!
//! let search = debounce::Debouncer::new(String::new(), Duration::from_millis(500))?;
//! let mut query = search.subscribe();
//!
//! search.push("r".to_string());
//! search.push("ru".to_string());
//! search.push("rust".to_string());
//!
//! // Fires once, 500ms after the last keystroke
//! query.changed().await.ok();
//! assert_eq!(*query.borrow(), "rust");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod keyed;
pub mod scheduler;

// Re-exports
pub use config::DebounceConfig;
pub use debounce::{DebounceState, Debouncer};
pub use error::{DebounceError, Result};
pub use keyed::KeyedDebouncer;
pub use scheduler::{ManualScheduler, ManualTimer, Scheduler, Task, TokioScheduler};
