//! Configuration
//!
//! Settings are assembled once at startup from command line arguments and
//! environment variables, then shared read-only through `AppState`.

mod schema;

pub use schema::*;
