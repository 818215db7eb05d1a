//! Text helpers for rendering values and reading captured packets.

pub mod hex;
