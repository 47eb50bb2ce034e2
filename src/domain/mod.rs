//! Core domain types and logic.

pub mod backtest;
pub mod bar;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod mode_chain;
pub mod position;
pub mod recommender;
pub mod regime;
pub mod risk_filter;
pub mod risk_targets;
pub mod scoring;
pub mod snapshot;
pub mod universe;
