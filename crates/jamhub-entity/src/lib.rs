//! # jamhub-entity
//!
//! Domain entity models for JamHub. A [`jam::Jam`] is the stored session
//! document; everything else in this crate is a value object owned by it.
//! The pure playback rules (clamping and the index shift on removal) live
//! here so every manager applies them identically.

pub mod jam;

pub use jam::{Jam, JamPatch, JamSnapshot, JamSummary};
