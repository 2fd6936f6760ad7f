pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod feeds;
pub mod ui;
