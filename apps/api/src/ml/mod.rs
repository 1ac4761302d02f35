pub mod features;
pub mod neighbors;
pub mod scaler;
pub mod similarity;

pub use features::{FeatureColumn, FeatureEncoder, FeatureSchema, RatingBand, UNKNOWN_LANGUAGE};
pub use neighbors::{Neighbor, NeighborIndex};
pub use scaler::StandardScaler;
