//! Gateway middleware

pub mod rate_limit;
