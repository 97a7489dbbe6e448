pub mod document;
pub mod outbox;
pub mod sender;
pub mod worker;

pub use document::*;
pub use outbox::*;
pub use sender::*;
pub use worker::*;
