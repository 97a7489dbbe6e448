pub mod directory;
pub mod memory;
pub mod store;

pub use directory::{ClinicDirectory, DirectoryError, OpeningBalance, SeedSummary};
pub use memory::InMemoryStore;
pub use store::*;
