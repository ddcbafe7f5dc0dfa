pub mod dataset;

pub use dataset::{Dataset, derive_bounds};
