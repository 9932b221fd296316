pub mod handlers;
pub mod measure_handlers;
pub mod routes;

pub use handlers::*;
pub use measure_handlers::*;
pub use routes::*;
