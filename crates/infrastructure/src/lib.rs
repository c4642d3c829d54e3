//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_access_store;
mod in_memory_session_context;
mod postgres_access_store;
mod tracing_error_reporter;

pub use in_memory_access_store::InMemoryAccessStore;
pub use in_memory_session_context::InMemorySessionContext;
pub use postgres_access_store::PostgresAccessStore;
pub use tracing_error_reporter::TracingErrorReporter;
