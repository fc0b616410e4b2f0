mod cache;
pub use self::cache::*;
