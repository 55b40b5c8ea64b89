//! RockSniffer HTTP polling.

mod client;

pub use client::*;
