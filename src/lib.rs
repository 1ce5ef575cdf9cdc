pub mod catalog;
pub mod charts;
pub mod config;
pub mod export;
pub mod interpret;
pub mod models;
pub mod report;
pub mod responses;
pub mod scoring;
pub mod telemetry;
