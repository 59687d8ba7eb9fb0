//! HTTP surface and daily scheduler for the trending pipeline.

pub mod api;
pub mod metrics;
pub mod scheduler;
pub mod state;
