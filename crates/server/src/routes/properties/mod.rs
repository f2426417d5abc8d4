pub mod get_properties;

pub use get_properties::*;
