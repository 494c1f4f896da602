pub mod linear;

pub use linear::{Emissions, WeightMatrix};
