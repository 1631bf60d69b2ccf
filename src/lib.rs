//! A reliable file-transfer protocol over UDP: selective-repeat
//! sliding-window data transfer on top of a three-way, window-negotiating
//! handshake.
//!
//! This crate is pure protocol logic plus a thin [`transport`]
//! abstraction; the binaries in `src/bin/` own file I/O, argument
//! parsing, and progress reporting.

mod err;
pub use err::*;

pub mod codec;
pub mod handshake;
pub mod receiver;
pub mod sender;
pub mod stats;
pub mod transport;

pub mod baseline;
