pub mod config;
pub mod error;
pub mod types;

pub use error::{SeedlockError, SeedlockResult};
pub use types::Chain;
