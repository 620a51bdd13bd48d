//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_identity_service;

pub use in_memory_identity_service::InMemoryIdentityService;
