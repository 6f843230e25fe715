//! Core type definitions used across the JamHub workspace.

pub mod id;

pub use id::{Identity, JamCode, TrackId};
