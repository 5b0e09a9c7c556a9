//! Command transport over a Unix socket.
//!
//! Key-bind helpers and scripts connect to the socket and write one JSON
//! command per line; see [`listener`] for the wire format.

pub mod listener;
