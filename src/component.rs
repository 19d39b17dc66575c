//! Constructor injection
//!
//! A [`Component`] declares its constructor parameters as the associated
//! `Dependencies` type and builds itself from them. The container resolves
//! that parameter list left to right, then calls [`Component::construct`].
//!
//! # Example
//!
//! ```rust
//! use idiocy::{Component, Container, upcast};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! impl Component for FixedClock {
//!     type Dependencies = ();
//!
//!     fn construct(_: ()) -> Self {
//!         FixedClock
//!     }
//! }
//!
//! struct Scheduler {
//!     clock: Arc<dyn Clock>,
//! }
//!
//! impl Component for Scheduler {
//!     type Dependencies = Arc<dyn Clock>;
//!
//!     fn construct(clock: Arc<dyn Clock>) -> Self {
//!         Scheduler { clock }
//!     }
//! }
//!
//! upcast!(FixedClock => dyn Clock);
//!
//! let container = Container::new();
//! container.singleton::<dyn Clock, FixedClock>().unwrap();
//! container.transient::<Scheduler, Scheduler>().unwrap();
//!
//! let scheduler = container.resolve::<Scheduler>().unwrap();
//! assert_eq!(scheduler.clock.now(), 42);
//! ```

use crate::{Container, Injectable, Result, ServiceId};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

// =============================================================================
// Component Trait
// =============================================================================

/// A concrete type the container can construct.
///
/// `Dependencies` is the constructor's parameter list:
///
/// - `()` - No dependencies
/// - `Arc<S>` - Single required service (`S` may be `dyn Trait`)
/// - `Option<Arc<S>>` - Service that may be unregistered
/// - `(A, B, ...)` - Several of the above, resolved left to right (up to 12)
///
/// Each type has exactly one `construct`, so there is never a choice of
/// constructor to make at runtime.
pub trait Component: Injectable + Sized {
    /// The constructor's parameters.
    type Dependencies: Resolvable;

    /// Build the component from its resolved dependencies.
    fn construct(deps: Self::Dependencies) -> Self;

    /// Services this component depends on, in resolution order
    fn dependency_ids() -> Vec<ServiceId> {
        Self::Dependencies::service_ids()
    }
}

/// Resolve `C`'s dependencies and construct it
pub(crate) fn activate<C: Component>(container: &Container) -> Result<C> {
    #[cfg(feature = "logging")]
    trace!(
        target: "idiocy",
        component = std::any::type_name::<C>(),
        dependencies = C::Dependencies::service_ids().len(),
        "Activating component"
    );

    let deps = C::Dependencies::resolve(container)?;
    Ok(C::construct(deps))
}

// =============================================================================
// Resolvable Trait - Constructor parameters
// =============================================================================

/// A constructor parameter list the container knows how to fill.
///
/// This is implemented for:
/// - `()` - No dependencies
/// - `Arc<S>` - Single service
/// - `Option<Arc<S>>` - Optional service
/// - Tuples of `Resolvable` - Multiple services
pub trait Resolvable: Sized {
    /// Resolve this parameter list from the container.
    ///
    /// The first failing dependency aborts the resolution.
    fn resolve(container: &Container) -> Result<Self>;

    /// Identities requested by this parameter list, in order
    fn service_ids() -> Vec<ServiceId>;
}

// No dependencies
impl Resolvable for () {
    #[inline]
    fn resolve(_container: &Container) -> Result<Self> {
        Ok(())
    }

    fn service_ids() -> Vec<ServiceId> {
        Vec::new()
    }
}

// Single dependency
impl<S: ?Sized + Injectable> Resolvable for Arc<S> {
    #[inline]
    fn resolve(container: &Container) -> Result<Self> {
        container.resolve::<S>()
    }

    fn service_ids() -> Vec<ServiceId> {
        vec![ServiceId::of::<S>()]
    }
}

// Optional dependency
impl<S: ?Sized + Injectable> Resolvable for Option<Arc<S>> {
    #[inline]
    fn resolve(container: &Container) -> Result<Self> {
        container.try_resolve::<S>()
    }

    fn service_ids() -> Vec<ServiceId> {
        vec![ServiceId::of::<S>()]
    }
}

// Tuple implementations (2-12 elements); tuple expressions evaluate left to right
macro_rules! impl_resolvable_tuple {
    ($($T:ident),+) => {
        impl<$($T: Resolvable),+> Resolvable for ($($T,)+) {
            #[inline]
            fn resolve(container: &Container) -> Result<Self> {
                Ok(($($T::resolve(container)?,)+))
            }

            fn service_ids() -> Vec<ServiceId> {
                let mut ids = Vec::new();
                $(ids.extend($T::service_ids());)+
                ids
            }
        }
    };
}

impl_resolvable_tuple!(A, B);
impl_resolvable_tuple!(A, B, C);
impl_resolvable_tuple!(A, B, C, D);
impl_resolvable_tuple!(A, B, C, D, E);
impl_resolvable_tuple!(A, B, C, D, E, F);
impl_resolvable_tuple!(A, B, C, D, E, F, G);
impl_resolvable_tuple!(A, B, C, D, E, F, G, H);
impl_resolvable_tuple!(A, B, C, D, E, F, G, H, I);
impl_resolvable_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_resolvable_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_resolvable_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

// =============================================================================
// Module - Group related registrations
// =============================================================================

/// A group of related registrations.
///
/// # Example
///
/// ```rust
/// use idiocy::{Component, Container, Module, Result};
///
/// struct Database;
///
/// impl Component for Database {
///     type Dependencies = ();
///     fn construct(_: ()) -> Self { Database }
/// }
///
/// struct Cache;
///
/// impl Component for Cache {
///     type Dependencies = ();
///     fn construct(_: ()) -> Self { Cache }
/// }
///
/// struct DataModule;
///
/// impl Module for DataModule {
///     fn register(container: &Container) -> Result<()> {
///         container.singleton::<Database, Database>()?;
///         container.transient::<Cache, Cache>()
///     }
/// }
///
/// let container = Container::new();
/// container.install::<DataModule>().unwrap();
///
/// assert!(container.contains::<Database>());
/// assert!(container.contains::<Cache>());
/// ```
pub trait Module {
    /// Register all services in this module.
    fn register(container: &Container) -> Result<()>;
}

// =============================================================================
// Tests
// =============================================================================
