pub mod builder;
pub mod emitter;
pub mod fetcher;
pub mod roles;
pub mod static_source;

pub use crate::domain::model::{Group, HostVars, InventoryDocument};
pub use crate::domain::ports::ResourceSource;
pub use crate::utils::error::Result;
