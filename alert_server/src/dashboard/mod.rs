//! Trend queries and chart specs for the alert detail panel.

pub mod chart;
pub mod trend;
