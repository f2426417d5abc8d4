pub mod home;
pub mod properties;

pub use home::*;
pub use properties::*;
