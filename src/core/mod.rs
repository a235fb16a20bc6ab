//! Expansion core: the token engine and the physics macro package.

pub mod engine;
pub mod physics;
