//! Response formatting: HTTP body to snake-cased structured values.

mod json;

pub use self::json::*;
