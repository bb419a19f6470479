//! Subcommand implementations.

pub mod extract;
pub mod health;
pub mod methods;
pub mod tools;
