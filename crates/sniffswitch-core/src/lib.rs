//! # sniffswitch-core
//!
//! Core library for the RockSniffer → OBS scene switcher.
//!
//! This crate provides:
//! - Settings loading (INI file, written with defaults when missing)
//! - RockSniffer game state polling over HTTP
//! - OBS scene/source control over obs-websocket
//! - The switcher loop that ties the two together

pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod network;
pub mod retry;
pub mod shutdown;
pub mod switcher;

pub use config::{
    Behaviour, ControllerSettings, Mode, Settings, SnifferSettings, SourceRule, SourceState,
};
pub use controller::{ItemId, ObsController, SceneController, SceneItem};
pub use error::{Error, Result};
pub use game::{GameState, parse_state};
pub use network::{SnifferClient, StateSource};
pub use retry::{CONNECT_RETRY_DELAY, FixedDelay, RetryStrategy, connect_with_retry};
pub use shutdown::ShutdownSignal;
pub use switcher::{LoopState, Switcher};
