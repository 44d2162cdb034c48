pub mod conversation;
pub mod history;
pub mod mood;
pub mod payload;
pub mod report;
pub mod sentiment;
pub mod similarity;

pub use conversation::{Role, SessionStatus, UnknownVariant};
pub use payload::ParseError;
