pub mod outputs;
pub mod request;
pub mod snapshot;

// Re-export all public types for convenient `use crate::types::*` imports.
pub use self::outputs::*;
pub use self::request::*;
pub use self::snapshot::*;
