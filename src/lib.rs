pub mod config;
pub mod core;
pub mod directory;
pub mod main_module;
pub mod tables;
pub mod tickets;
pub mod web;

pub use crate::core::shared;
