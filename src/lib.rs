pub mod cli;
pub mod config;
pub mod dashboard;
pub mod dom;
pub mod logging;
pub mod page;
pub mod poller;
pub mod render;
pub mod stats;
pub mod stream;
pub mod viewport;
pub mod web;
