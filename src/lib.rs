pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod notice;
pub mod poller;
pub mod refresh;
pub mod routes;
pub mod server;
pub mod state;
pub mod stats;
