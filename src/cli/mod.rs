pub mod checkpoint;
pub mod hook;
pub mod session_start;
pub mod summary;
pub mod validate;
