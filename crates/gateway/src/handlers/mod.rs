//! API handlers module

pub mod domains;
pub mod health;
pub mod resolve;
