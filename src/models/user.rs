pub mod filter;
mod queries;
mod types;

pub use self::filter::UserFilter;
pub use self::queries::*;
pub use self::types::*;
