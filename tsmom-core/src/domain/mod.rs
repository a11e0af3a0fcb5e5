//! Domain types for TSMOM Lab.

pub mod curve;
pub mod series;

pub use curve::{CurveKind, EquityCurve};
pub use series::{PriceSeries, ReturnSeries, SeriesError};
