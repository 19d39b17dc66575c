//! Activators and component registrations
//!
//! An activator is a type-erased closure that produces one instance of a
//! component, resolving the component's own dependencies through the
//! container it is handed. The registration pairs it with a lifetime.

use crate::component::{Component, activate};
use crate::{Container, Injectable, Lifetime, Result, ServiceId, Upcast};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased service instance.
///
/// Holds the typed `Arc<S>` of the service it was created for, so unsized
/// services (`dyn Trait`) survive the round trip through `Any`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased activator function
type ActivatorFn = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// Binding of one service identity to an activation strategy and a lifetime.
///
/// Cloning is cheap; the activator is shared.
#[derive(Clone)]
pub struct ComponentRegistration {
    service: ServiceId,
    component: &'static str,
    lifetime: Lifetime,
    activator: ActivatorFn,
}

impl ComponentRegistration {
    /// Registration backed by an explicit factory closure
    pub(crate) fn from_factory<S, F>(lifetime: Lifetime, factory: F) -> Self
    where
        S: ?Sized + Injectable,
        F: Fn(&Container) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        Self {
            service: ServiceId::of::<S>(),
            component: std::any::type_name::<F>(),
            lifetime,
            activator: Arc::new(move |container| {
                factory(container).map(|service| Arc::new(service) as Instance)
            }),
        }
    }

    /// Registration that constructs `C` with constructor injection and exposes it as `S`
    pub(crate) fn component<S, C>(lifetime: Lifetime) -> Self
    where
        S: ?Sized + Injectable,
        C: Component + Upcast<S>,
    {
        Self {
            component: std::any::type_name::<C>(),
            ..Self::from_factory::<S, _>(lifetime, |container| {
                activate::<C>(container).map(|component| <C as Upcast<S>>::upcast(Arc::new(component)))
            })
        }
    }

    /// Singleton registration around an instance that already exists
    pub(crate) fn instance<S: ?Sized + Injectable>(instance: Arc<S>) -> Self {
        Self {
            component: std::any::type_name::<S>(),
            ..Self::from_factory::<S, _>(Lifetime::Singleton, move |_| Ok(Arc::clone(&instance)))
        }
    }

    /// Identity of the service this registration provides
    #[inline]
    pub fn service(&self) -> ServiceId {
        self.service
    }

    /// Type name of the component (or factory) behind the service
    #[inline]
    pub fn component_name(&self) -> &'static str {
        self.component
    }

    /// Declared lifetime
    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Run the activator once
    #[inline]
    pub(crate) fn activate(&self, container: &Container) -> Result<Instance> {
        (self.activator)(container)
    }
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("service", &self.service)
            .field("component", &self.component)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
