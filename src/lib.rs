pub mod commands;
pub mod config;
pub mod error;
pub mod framework;
pub mod http;
pub mod launch;
pub mod mods;
pub mod overlay;
pub mod release;
pub mod runtime;
