pub mod aggregator;
pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod data;
pub mod export;
pub mod presenter;
pub mod services;
