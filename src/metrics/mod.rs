pub mod catalog;
pub mod collector;
pub mod exposition;
pub mod sample;

pub use catalog::{Catalog, MetricDesc};
pub use collector::Collector;
pub use sample::MetricSample;
