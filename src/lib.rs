pub mod analysis;
pub mod backtester;
pub mod calculator;
pub mod commands;
pub mod config;
pub mod context;
pub mod data_context;
pub mod error;
pub mod indicators;
pub mod models;
pub mod performance;
pub mod signals;
pub mod strategy;
