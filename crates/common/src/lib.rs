//! Multiload Common Library
//!
//! Settings, the bounded concurrent load runner, and the cryptographic work
//! unit shared by the multiload harnesses.

pub mod config;
pub mod crypto;
pub mod error;
pub mod load;
pub mod work;

// Re-export commonly used types
pub use config::{LoadConfig, LoadSettings};
pub use crypto::{CryptoLoad, KeyLength};
pub use error::{Error, Result};
pub use load::{max_wait, run_load, LoadOutcome, LoadReport, LoadRun, WorkerStats};
pub use work::{work_fn, WorkFn, WorkUnit};

/// Multiload version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    std::path::PathBuf::from("multiload.toml")
}
