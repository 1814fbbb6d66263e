//! Library side of the risk CLI: logging, input collection and tables.

pub mod input;
pub mod logging;
pub mod summary;
