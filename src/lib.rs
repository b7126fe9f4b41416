pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod mvi;
pub mod notify;
pub mod profile;
pub mod session;
