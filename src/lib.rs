//! Rktri Grass - per-frame grass blade simulation and visibility kernel

pub mod core;
pub mod grass;
