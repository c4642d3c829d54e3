//! Authorization entities and the pure decision unit.

#![forbid(unsafe_code)]

mod access;
mod security;

pub use access::{AccessDecision, AccessSnapshot, AuthorizationView, FetchTicket, QueryState};
pub use security::{Permission, PermissionDescriptor, PermissionSet, Role};
