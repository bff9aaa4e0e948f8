//! Weekly trainee-feedback analytics client.
//!
//! The library fetches sentiment trends, insights and reports from the
//! analytics backend and turns them into display-ready views for the
//! dashboard, the report list and the report detail screens.

pub mod availability;
pub mod config;
pub mod dashboard;
pub mod gateway;
pub mod insight;
pub mod metrics;
pub mod model;
pub mod render;
pub mod reports;
pub mod upload;
pub mod validation;
pub mod week;
