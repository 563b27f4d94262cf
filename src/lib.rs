pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{CliConfig, InventoryConfig};
pub use crate::core::{
    builder::InventoryBuilder,
    emitter::{emit, Output, OutputMode},
    fetcher::ApiFetcher,
    static_source::StaticInventory,
};
pub use crate::utils::error::{InventoryError, Result};
