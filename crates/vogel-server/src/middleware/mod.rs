//! HTTP middleware: request ID and edit-key guard.

pub mod edit_key;
pub mod request_id;
