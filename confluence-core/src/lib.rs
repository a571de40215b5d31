//! Confluence Core — multi-timeframe confluence signal scanning.
//!
//! This crate contains the decision core and the plumbing around it:
//! - Domain types (candles with typed indicator fields, ordered series, bias)
//! - Indicator computation (EMA, SMMA, MACD, stochastic, ATR)
//! - Swing detection and Fibonacci levels
//! - Multi-timeframe analysis into a validated snapshot
//! - Confluence scoring, risk/reward validation, and the gate pipeline
//! - Configuration, CSV data loading, notification formatting and cooldown
//!
//! Scoring, validation and the pipeline perform no I/O.

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod notify;
pub mod pipeline;
pub mod risk;
pub mod scoring;
pub mod swing;
