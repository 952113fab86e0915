pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::restart::CommandRestarter;
pub use adapters::tencent::TencentSslClient;
pub use config::RenewalConfig;
pub use core::engine::RenewalEngine;
pub use utils::error::{RenewError, Result};
