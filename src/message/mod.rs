//! Commit message sources: sanitizing, per-commit and batched generation.

pub mod batch;
pub mod sanitize;
pub mod single;
pub mod source;

pub use batch::{BatchMessageGenerator, parse_batch_reply};
pub use sanitize::{MAX_MESSAGE_CHARS, clean_reply, sanitize};
pub use single::MessageGenerator;
pub use source::{GeneratedMessage, GenerationMode, MessageSource};
