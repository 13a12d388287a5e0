//! Control-law building blocks.
//!
//! Pure computation only — the [`crate::controller`] module owns the state
//! and sequences these pieces once per tick.

pub mod anticogging;
pub mod cascade;
pub mod kinematics;
