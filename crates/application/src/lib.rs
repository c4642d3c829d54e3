//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod authorization_session;
mod permission_set_resolver;
mod role_resolver;

pub use access_ports::{
    AccessLookup, AccessStore, GrantRecord, ResolutionErrorReporter, ResolutionFailure,
    RoleRecord, SessionContextSource,
};
pub use authorization_session::{AuthorizationSession, KeyedView};
pub use permission_set_resolver::PermissionSetResolver;
pub use role_resolver::RoleResolver;
