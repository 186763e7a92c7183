//! The three tasks behind one transport connection: read, write, ping.

pub(crate) mod ping;
pub(crate) mod read;
pub(crate) mod write;
