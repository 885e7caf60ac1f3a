//! gensynth: a host and engine for interchangeable generative-art plugins.
//!
//! Plugins declare parameters and draw onto a [`plugin::Surface`]; the
//! [`engine::Engine`] resolves those parameters, modulates them with noise,
//! paces the plugin's steps, routes user edits and persists everything.

pub mod config;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod noise;
pub mod param;
pub mod persist;
pub mod plugin;
pub mod scheduler;
pub mod tui;
