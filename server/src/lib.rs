//! Arena server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod api;
pub mod broadcast;
pub mod bullet;
pub mod config;
pub mod directory;
pub mod map;
pub mod player;
pub mod protocol;
pub mod room;
pub mod ws;
