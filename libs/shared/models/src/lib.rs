pub mod billing;
pub mod clinic;
pub mod error;
pub mod scheduling;

pub use billing::*;
pub use clinic::*;
pub use scheduling::*;
