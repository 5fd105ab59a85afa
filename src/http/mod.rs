//! HTTP request fan-out and outcome aggregation.
pub(crate) mod dispatch;
pub(crate) mod outcome;
