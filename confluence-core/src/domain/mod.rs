//! Domain types shared by every stage of the signal pipeline.

pub mod candle;
pub mod market;
pub mod series;

pub use candle::{Candle, IndicatorFields};
pub use market::{Bias, Direction, TimeframeRole};
pub use series::{SeriesError, TimeSeries};
