//! # Idiocy - A Minimal Inversion-of-Control Container
//!
//! A registry mapping service contracts to the components that fulfil them,
//! and a resolver that builds components on demand, satisfying their
//! constructor dependencies recursively.
//!
//! ## Features
//!
//! - 🧩 **Constructor injection** - A component lists its dependencies as a type; the container resolves them in order
//! - 🔒 **Type-safe identities** - Services are keyed by `TypeId`, including `dyn Trait` contracts
//! - ♻️ **Transient services** - Fresh instance on every resolve
//! - 🏭 **Singletons** - Created once on first access, even under concurrent resolution
//! - 🔁 **Cycle detection** - A cyclic dependency graph fails with an error instead of overflowing the stack
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use idiocy::{Component, Container, upcast};
//! use std::sync::Arc;
//!
//! trait Database: Send + Sync {
//!     fn url(&self) -> &str;
//! }
//!
//! struct Postgres;
//!
//! impl Database for Postgres {
//!     fn url(&self) -> &str {
//!         "postgres://localhost"
//!     }
//! }
//!
//! impl Component for Postgres {
//!     type Dependencies = ();
//!     fn construct(_: ()) -> Self { Postgres }
//! }
//!
//! struct UserService {
//!     db: Arc<dyn Database>,
//! }
//!
//! impl Component for UserService {
//!     type Dependencies = Arc<dyn Database>;
//!     fn construct(db: Arc<dyn Database>) -> Self { UserService { db } }
//! }
//!
//! upcast!(Postgres => dyn Database);
//!
//! let container = Container::new();
//!
//! // Register: service contract first, component second
//! container.singleton::<dyn Database, Postgres>().unwrap();
//! container.transient::<UserService, UserService>().unwrap();
//!
//! // Resolve - returns Arc<S>, dependencies injected
//! let users = container.resolve::<UserService>().unwrap();
//! assert_eq!(users.db.url(), "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! ```rust
//! use idiocy::{Container, Lifetime};
//! use std::sync::Arc;
//!
//! struct Config { debug: bool }
//!
//! let container = Container::new();
//!
//! // Singleton - one instance, shared everywhere
//! container
//!     .register_factory::<Config, _>(Lifetime::Singleton, |_| Ok(Arc::new(Config { debug: true })))
//!     .unwrap();
//!
//! let a = container.resolve::<Config>().unwrap();
//! let b = container.resolve::<Config>().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```
//!
//! ## Concurrency
//!
//! Resolution is synchronous and never performs I/O. Singleton creation is an
//! atomic get-or-create: concurrent first resolutions of the same singleton
//! run its activator exactly once. Register everything before resolving and
//! call [`Container::lock`] to close the registration phase; the registry
//! tolerates concurrent registration, but a resolve racing a register may or
//! may not see the new service.

mod cache;
mod component;
mod container;
mod error;
mod factory;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registry;

pub use component::*;
pub use container::*;
pub use error::*;
pub use factory::ComponentRegistration;
pub use provider::*;

#[cfg(feature = "derive")]
pub use idiocy_derive::Component;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Component, Container, DiError, Injectable, Lifetime, Module, Resolvable, Result,
        ServiceId, Upcast, upcast,
    };
    pub use std::sync::Arc;
}
