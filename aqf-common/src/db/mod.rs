//! SQLite storage

pub mod init;
pub mod training_rows;

pub use init::*;
pub use training_rows::*;
