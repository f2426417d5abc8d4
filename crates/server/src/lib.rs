pub mod db;
mod routes;
pub mod search;
mod startup;
mod utils;
pub mod validation;
pub mod weather;

pub use db::{Database, EnrichedProperty, PropertyQuery, PropertyRecord, PropertyStore, StoreError};
pub use routes::*;
pub use search::*;
pub use startup::*;
pub use utils::*;
pub use validation::*;
pub use weather::*;
