//! Route handlers organized by domain.

pub mod health;
pub mod jam;
pub mod ws;
