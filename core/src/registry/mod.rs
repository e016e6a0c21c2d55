//! Registries owned by the embedding application.
//!
//! Neither registry is process-global: the application creates them during
//! startup and hands references to whoever needs to look things up.

mod class;
mod objects;

pub use class::{ClassRegistry, Constructor};
pub use objects::{ObjectRegistry, ObjectRegistryBuilder};

#[cfg(test)]
mod registry_test;
