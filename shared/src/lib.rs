//! Wire types and gameplay constants shared between the arena server and
//! the browser client (exported to TypeScript through `ts-rs`).

pub mod config;
pub mod protocol;
pub mod vec2;
