pub mod common;
pub mod database;
pub mod error;
pub mod measure;
pub mod outcome;

pub use common::*;
pub use database::*;
pub use error::*;
pub use measure::*;
pub use outcome::*;
