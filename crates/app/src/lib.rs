//! Command line host for the panic button.

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod services;
