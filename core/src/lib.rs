//! Nickel Watch: synthetic nickel-mining land-change, financial and
//! transaction-risk analytics behind two dashboards.
//!
//! Data flows one way:
//!   generator -> store -> derived metrics -> models -> page views

pub mod anomaly;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod financial;
pub mod generator;
pub mod land;
pub mod name_generator;
pub mod network;
pub mod risk;
pub mod rng;
pub mod session;
pub mod stakeholder;
pub mod store;
pub mod types;
pub mod view;
