//! Service identity, lifetimes and the traits that bind components to services
//!
//! A *service* is the contract callers ask for (usually `dyn Trait`), a
//! *component* is the concrete type that fulfils it.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Marker trait for types that can be resolved from the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`,
/// sized or not, so `dyn MyTrait` works as a service as long as the trait has
/// `Send + Sync` supertraits.
///
/// # Examples
///
/// ```rust
/// use idiocy::{Injectable, ServiceId};
///
/// trait Clock: Send + Sync {}
///
/// // No impl needed - it just works!
/// assert_eq!(<dyn Clock as Injectable>::service_id(), ServiceId::of::<dyn Clock>());
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Identity used as the registry key for this service
    #[inline]
    fn service_id() -> ServiceId {
        ServiceId::of::<Self>()
    }
}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Typed identity of a service contract.
///
/// Equality and hashing use the `TypeId` only; the type name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct ServiceId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceId {
    /// Identity of `S`, which may be unsized (`dyn Trait`)
    #[inline]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: std::any::type_name::<S>(),
        }
    }

    /// The underlying `TypeId`
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Human-readable type name
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ServiceId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceId {}

impl Hash for ServiceId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceId").field(&self.type_name).finish()
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Service lifetime specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// New instance created on every resolve
    #[default]
    Transient,

    /// Created on first resolve, then shared for the container's life
    Singleton,
}

impl Lifetime {
    /// Name used in log output
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Transient => "transient",
            Lifetime::Singleton => "singleton",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a shared component into the service it provides.
///
/// Every type provides itself. For trait services, implement this with the
/// [`upcast!`](crate::upcast) macro or `#[provides(dyn Trait)]` on
/// `#[derive(Component)]`; the body is a plain unsizing coercion.
pub trait Upcast<S: ?Sized> {
    /// Convert `Arc<Self>` into `Arc<S>`
    fn upcast(self: Arc<Self>) -> Arc<S>;
}

impl<T: Injectable> Upcast<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declare which services a component provides.
///
/// # Examples
///
/// ```rust
/// use idiocy::{upcast, Upcast};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// upcast!(English => dyn Greeter);
///
/// let greeter: Arc<dyn Greeter> = Arc::new(English).upcast();
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[macro_export]
macro_rules! upcast {
    ($component:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::Upcast<$service> for $component {
                #[inline]
                fn upcast(self: $crate::Arc<Self>) -> $crate::Arc<$service> {
                    self
                }
            }
        )+
    };
}
