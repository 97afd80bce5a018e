pub mod admin;
pub mod submit;

pub use admin::*;
pub use submit::*;
