//! Walk graph command-line client library.
//!
//! Connection handling, argument parsing helpers and reply rendering used by
//! the `walkgraph-cli` binary.

pub mod client;
pub mod output;
pub mod point;
pub mod terminal;
