pub mod expression;
pub mod layer;
pub mod legend;
pub mod length;
pub mod regions;
pub mod symbology;
pub mod terrain;
pub mod trails;

pub use expression::{Expr, FeatureContext, Op};
pub use layer::*;
pub use legend::{LegendBucket, LegendSelection, WAYS_LEGEND_BUCKETS};
pub use length::{LengthEncoding, LengthMeasurement};
pub use symbology::BaseStyle;
pub use trails::TrailSource;
