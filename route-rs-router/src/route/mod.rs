mod file;
pub use self::file::*;

mod table;
pub use self::table::*;
