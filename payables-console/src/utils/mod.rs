pub mod error_message;
pub mod format;
pub mod wire;
