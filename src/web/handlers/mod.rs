//! Route handler modules.

pub mod health;
pub mod webhook;
