//! Runner command implementations.

pub mod call;
pub mod config;
pub mod paths;
pub mod serve;
