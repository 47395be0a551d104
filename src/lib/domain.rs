//! Domain logic

pub mod config;
pub mod email;
