//! CLI command implementations

pub mod chunk;
pub mod evaluate;
pub mod init;

pub use chunk::*;
pub use evaluate::*;
pub use init::*;
