//! Data models for casesync.

mod daily;
mod feature;
pub mod fields;
mod snapshot;

pub use daily::{CumulativeTotals, DailyRecord};
pub use feature::{CountyFeature, TotalsFeature};
pub use snapshot::{CountyRow, ScrapeSnapshot};
