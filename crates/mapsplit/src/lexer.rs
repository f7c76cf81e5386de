//! Low-level input scanning

pub mod cursor;

pub use cursor::Cursor;
