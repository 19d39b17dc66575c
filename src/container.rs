//! The IoC container
//!
//! The `Container` owns the registry and the singleton cache, and resolves
//! services by recursively activating their components.

use crate::cache::SingletonCache;
use crate::component::{Component, Module};
use crate::factory::{ComponentRegistration, Instance};
use crate::registry::Registry;
use crate::{DiError, Injectable, Lifetime, Result, ServiceId, Upcast};
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Resolution Guard (cycle detection)
// =============================================================================

thread_local! {
    /// Services currently being activated on this thread, keyed by container
    static RESOLVING: RefCell<Vec<(usize, ServiceId)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a service as in-progress for the lifetime of the guard.
///
/// Entering a service that is already in progress for the same container
/// means the dependency graph has a cycle.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(container: usize, service: ServiceId) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();

            let repeated = stack
                .iter()
                .position(|&(owner, id)| owner == container && id == service);

            if let Some(start) = repeated {
                let chain: Vec<ServiceId> = stack[start..]
                    .iter()
                    .filter(|(owner, _)| *owner == container)
                    .map(|(_, id)| *id)
                    .collect();
                return Err(DiError::circular(service, &chain));
            }

            stack.push((container, service));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

// =============================================================================
// Container
// =============================================================================

/// Inversion-of-control container.
///
/// Cloning is cheap and yields a handle to the same registry and cache.
///
/// # Examples
///
/// ```rust
/// use idiocy::{Component, Container, upcast};
///
/// trait Service: Send + Sync {}
///
/// struct Implementation;
/// impl Service for Implementation {}
///
/// impl Component for Implementation {
///     type Dependencies = ();
///     fn construct(_: ()) -> Self { Implementation }
/// }
///
/// upcast!(Implementation => dyn Service);
///
/// let container = Container::new();
/// container.transient::<dyn Service, Implementation>().unwrap();
///
/// let service = container.resolve::<dyn Service>().unwrap();
/// ```
#[derive(Clone)]
pub struct Container {
    /// Service identity -> registration
    registry: Arc<Registry>,
    /// Singleton instances created so far
    singletons: Arc<SingletonCache>,
    /// Lock state - set once registration is finished
    locked: Arc<AtomicBool>,
}

impl Container {
    /// Create an empty container.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use idiocy::Container;
    /// let container = Container::new();
    /// assert!(container.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "idiocy", "Creating new IoC container");

        Self::with_capacity(0)
    }

    /// Create a container with pre-allocated capacity.
    ///
    /// Use this when you know approximately how many services will be registered.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::with_capacity(capacity)),
            singletons: Arc::new(SingletonCache::with_capacity(capacity)),
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Bind component `C` to service `S` with the given lifetime.
    ///
    /// `C` is constructed through [`Component::construct`], its dependencies
    /// resolved from this container on every activation.
    ///
    /// # Errors
    ///
    /// - [`DiError::AlreadyRegistered`] if `S` already has a component;
    ///   the existing registration is kept.
    /// - [`DiError::Locked`] after [`lock`](Self::lock).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use idiocy::{Component, Container, DiError, Lifetime};
    ///
    /// struct Database;
    ///
    /// impl Component for Database {
    ///     type Dependencies = ();
    ///     fn construct(_: ()) -> Self { Database }
    /// }
    ///
    /// let container = Container::new();
    /// container.register::<Database, Database>(Lifetime::Singleton).unwrap();
    ///
    /// let again = container.register::<Database, Database>(Lifetime::Transient);
    /// assert!(matches!(again, Err(DiError::AlreadyRegistered { .. })));
    /// ```
    pub fn register<S, C>(&self, lifetime: Lifetime) -> Result<()>
    where
        S: ?Sized + Injectable,
        C: Component + Upcast<S>,
    {
        self.insert(ComponentRegistration::component::<S, C>(lifetime))
    }

    /// Bind `C` to `S`, creating a new instance on every resolve.
    #[inline]
    pub fn transient<S, C>(&self) -> Result<()>
    where
        S: ?Sized + Injectable,
        C: Component + Upcast<S>,
    {
        self.register::<S, C>(Lifetime::Transient)
    }

    /// Bind `C` to `S`, creating one shared instance on first resolve.
    #[inline]
    pub fn singleton<S, C>(&self) -> Result<()>
    where
        S: ?Sized + Injectable,
        C: Component + Upcast<S>,
    {
        self.register::<S, C>(Lifetime::Singleton)
    }

    /// Bind `S` to an explicit factory closure.
    ///
    /// The factory receives the container so it can resolve its own
    /// dependencies, and may fail.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use idiocy::{Container, Lifetime};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU64, Ordering};
    ///
    /// static COUNTER: AtomicU64 = AtomicU64::new(0);
    ///
    /// struct RequestId(u64);
    ///
    /// let container = Container::new();
    /// container
    ///     .register_factory::<RequestId, _>(Lifetime::Transient, |_| {
    ///         Ok(Arc::new(RequestId(COUNTER.fetch_add(1, Ordering::SeqCst))))
    ///     })
    ///     .unwrap();
    ///
    /// let id1 = container.resolve::<RequestId>().unwrap();
    /// let id2 = container.resolve::<RequestId>().unwrap();
    /// assert_ne!(id1.0, id2.0); // Different instances
    /// ```
    pub fn register_factory<S, F>(&self, lifetime: Lifetime, factory: F) -> Result<()>
    where
        S: ?Sized + Injectable,
        F: Fn(&Container) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        self.insert(ComponentRegistration::from_factory::<S, F>(lifetime, factory))
    }

    /// Register an instance that already exists as a singleton.
    pub fn register_instance<S: ?Sized + Injectable>(&self, instance: Arc<S>) -> Result<()> {
        self.insert(ComponentRegistration::instance(instance))
    }

    /// Run a [`Module`]'s registrations against this container.
    pub fn install<M: Module>(&self) -> Result<()> {
        #[cfg(feature = "logging")]
        debug!(
            target: "idiocy",
            module = std::any::type_name::<M>(),
            "Installing module"
        );

        M::register(self)
    }

    fn insert(&self, registration: ComponentRegistration) -> Result<()> {
        self.check_not_locked()?;

        #[cfg(feature = "logging")]
        let (service, component, lifetime) = (
            registration.service(),
            registration.component_name(),
            registration.lifetime(),
        );

        let result = self.registry.register(registration);

        #[cfg(feature = "logging")]
        match &result {
            Ok(()) => debug!(
                target: "idiocy",
                service = service.type_name(),
                component = component,
                lifetime = lifetime.as_str(),
                service_count = self.registry.len(),
                "Registered service"
            ),
            Err(_) => debug!(
                target: "idiocy",
                service = service.type_name(),
                "Rejected duplicate registration"
            ),
        }

        result
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve a service.
    ///
    /// Singletons are created on first resolve and shared afterwards;
    /// transients are created fresh on every call. Dependencies are resolved
    /// recursively, each according to its own lifetime.
    ///
    /// # Errors
    ///
    /// - [`DiError::NotRegistered`] if `S`, or anything it depends on, has no
    ///   component. Nothing is constructed in that case.
    /// - [`DiError::CircularDependency`] if `S` is reached again while it is
    ///   still being activated.
    /// - Whatever a factory returns.
    #[inline]
    pub fn resolve<S: ?Sized + Injectable>(&self) -> Result<Arc<S>> {
        let service = ServiceId::of::<S>();
        let instance = self.resolve_service(service)?;

        instance.downcast_ref::<Arc<S>>().cloned().ok_or_else(|| {
            DiError::Internal(format!("registration for {service} produced a different type"))
        })
    }

    /// Resolve, returning `Ok(None)` if `S` itself is not registered.
    ///
    /// Errors raised further down the dependency graph still propagate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use idiocy::Container;
    ///
    /// struct OptionalService;
    ///
    /// let container = Container::new();
    /// assert!(container.try_resolve::<OptionalService>().unwrap().is_none());
    /// ```
    #[inline]
    pub fn try_resolve<S: ?Sized + Injectable>(&self) -> Result<Option<Arc<S>>> {
        if !self.registry.contains(&ServiceId::of::<S>()) {
            return Ok(None);
        }
        self.resolve::<S>().map(Some)
    }

    /// Lookup, cycle check and lifetime dispatch for one service
    fn resolve_service(&self, service: ServiceId) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "idiocy",
            service = service.type_name(),
            "Resolving service"
        );

        let Some(registration) = self.registry.lookup(&service) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "idiocy",
                service = service.type_name(),
                "Service not registered"
            );
            return Err(DiError::not_registered(service));
        };

        let _guard = match ResolutionGuard::enter(self.identity(), service) {
            Ok(guard) => guard,
            Err(err) => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "idiocy",
                    service = service.type_name(),
                    error = %err,
                    "Circular dependency detected"
                );
                return Err(err);
            }
        };

        match registration.lifetime() {
            Lifetime::Singleton => self
                .singletons
                .get_or_create(service, || registration.activate(self)),
            Lifetime::Transient => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "idiocy",
                    service = service.type_name(),
                    component = registration.component_name(),
                    "Creating new transient instance"
                );

                registration.activate(self)
            }
        }
    }

    /// Address of the shared registry; identifies this container and its clones
    #[inline]
    fn identity(&self) -> usize {
        Arc::as_ptr(&self.registry) as usize
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if a service is registered.
    #[inline]
    pub fn contains<S: ?Sized + Injectable>(&self) -> bool {
        self.registry.contains(&ServiceId::of::<S>())
    }

    /// Registration for a service identity, if any.
    #[inline]
    pub fn lookup(&self, service: &ServiceId) -> Option<ComponentRegistration> {
        self.registry.lookup(service)
    }

    /// Declared lifetime of a registered service.
    #[inline]
    pub fn lifetime_of<S: ?Sized + Injectable>(&self) -> Option<Lifetime> {
        self.registry.lifetime_of(&ServiceId::of::<S>())
    }

    /// Check if a singleton has already been created.
    #[inline]
    pub fn is_cached<S: ?Sized + Injectable>(&self) -> bool {
        self.singletons.get(&ServiceId::of::<S>()).is_some()
    }

    /// Get the number of registered services.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Check if no services are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Get all registered service identities.
    pub fn registered_services(&self) -> Vec<ServiceId> {
        self.registry.service_ids()
    }

    // =========================================================================
    // Lifecycle Methods
    // =========================================================================

    /// Lock the container to prevent further registrations.
    ///
    /// Marks the end of the registration phase; resolution is unaffected.
    #[inline]
    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);

        #[cfg(feature = "logging")]
        debug!(
            target: "idiocy",
            service_count = self.registry.len(),
            "Container locked - no further registrations allowed"
        );
    }

    /// Check if the container is locked.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    #[inline]
    fn check_not_locked(&self) -> Result<()> {
        if self.is_locked() {
            return Err(DiError::Locked);
        }
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.len())
            .field("singletons_created", &self.singletons.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    trait Repository: std::fmt::Debug + Send + Sync {
        fn name(&self) -> &str;
    }

    #[derive(Debug)]
    struct MemoryRepository;

    impl Repository for MemoryRepository {
        fn name(&self) -> &str {
            "memory"
        }
    }

    impl Component for MemoryRepository {
        type Dependencies = ();

        fn construct(_: ()) -> Self {
            MemoryRepository
        }
    }

    crate::upcast!(MemoryRepository => dyn Repository);

    #[derive(Debug)]
    struct Handler {
        repository: Arc<dyn Repository>,
    }

    impl Component for Handler {
        type Dependencies = Arc<dyn Repository>;

        fn construct(repository: Arc<dyn Repository>) -> Self {
            Handler { repository }
        }
    }

    #[test]
    fn test_transient() {
        let container = Container::new();
        container.transient::<dyn Repository, MemoryRepository>().unwrap();

        let r1 = container.resolve::<dyn Repository>().unwrap();
        let r2 = container.resolve::<dyn Repository>().unwrap();

        assert_eq!(r1.name(), "memory");
        assert!(!Arc::ptr_eq(&r1, &r2));
        assert!(!container.is_cached::<dyn Repository>());
    }

    #[test]
    fn test_singleton() {
        let container = Container::new();
        container.singleton::<dyn Repository, MemoryRepository>().unwrap();
        assert!(!container.is_cached::<dyn Repository>());

        let r1 = container.resolve::<dyn Repository>().unwrap();
        let r2 = container.resolve::<dyn Repository>().unwrap();

        assert!(Arc::ptr_eq(&r1, &r2));
        assert!(container.is_cached::<dyn Repository>());
    }

    #[test]
    fn test_clone_shares_state() {
        let container = Container::new();
        container.singleton::<dyn Repository, MemoryRepository>().unwrap();

        let handle = container.clone();
        let r1 = container.resolve::<dyn Repository>().unwrap();
        let r2 = handle.resolve::<dyn Repository>().unwrap();
        assert!(Arc::ptr_eq(&r1, &r2));
    }

    #[test]
    fn test_singleton_dependency_shared_by_transients() {
        let container = Container::new();
        container.singleton::<dyn Repository, MemoryRepository>().unwrap();
        container.transient::<Handler, Handler>().unwrap();

        let h1 = container.resolve::<Handler>().unwrap();
        let h2 = container.resolve::<Handler>().unwrap();

        assert!(!Arc::ptr_eq(&h1, &h2));
        assert!(Arc::ptr_eq(&h1.repository, &h2.repository));
    }

    #[test]
    fn test_transient_dependency_captured_by_singleton() {
        let container = Container::new();
        container.transient::<dyn Repository, MemoryRepository>().unwrap();
        container.singleton::<Handler, Handler>().unwrap();

        let h1 = container.resolve::<Handler>().unwrap();
        let h2 = container.resolve::<Handler>().unwrap();
        let fresh = container.resolve::<dyn Repository>().unwrap();

        assert!(Arc::ptr_eq(&h1, &h2));
        assert!(Arc::ptr_eq(&h1.repository, &h2.repository));
        assert!(!Arc::ptr_eq(&h1.repository, &fresh));
    }

    #[test]
    fn test_not_registered() {
        let container = Container::new();
        let err = container.resolve::<dyn Repository>().unwrap_err();

        match err {
            DiError::NotRegistered { service, .. } => {
                assert_eq!(service, ServiceId::of::<dyn Repository>())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_try_resolve() {
        let container = Container::new();
        assert!(container.try_resolve::<Handler>().unwrap().is_none());

        // Registered, but its dependency is not: the error surfaces
        container.transient::<Handler, Handler>().unwrap();
        let err = container.try_resolve::<Handler>().unwrap_err();
        assert!(err.is_not_registered());

        container.transient::<dyn Repository, MemoryRepository>().unwrap();
        assert!(container.try_resolve::<Handler>().unwrap().is_some());
    }

    #[test]
    fn test_duplicate_registration() {
        let container = Container::new();
        container.singleton::<dyn Repository, MemoryRepository>().unwrap();

        let err = container
            .transient::<dyn Repository, MemoryRepository>()
            .unwrap_err();
        assert!(matches!(err, DiError::AlreadyRegistered { .. }));

        // Original registration intact
        assert_eq!(container.lifetime_of::<dyn Repository>(), Some(Lifetime::Singleton));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_lookup() {
        let container = Container::new();
        container.transient::<dyn Repository, MemoryRepository>().unwrap();

        let registration = container.lookup(&ServiceId::of::<dyn Repository>()).unwrap();
        assert_eq!(registration.lifetime(), Lifetime::Transient);
        assert!(registration.component_name().ends_with("MemoryRepository"));

        assert!(container.lookup(&ServiceId::of::<Handler>()).is_none());
        assert_eq!(
            container.registered_services(),
            vec![ServiceId::of::<dyn Repository>()]
        );
    }

    #[test]
    fn test_lock() {
        let container = Container::new();
        assert!(!container.is_locked());

        container.lock();
        assert!(container.is_locked());

        let err = container
            .transient::<dyn Repository, MemoryRepository>()
            .unwrap_err();
        assert!(matches!(err, DiError::Locked));
        assert!(container.is_empty());
    }

    #[test]
    fn test_factory_can_resolve() {
        let container = Container::new();
        container.singleton::<dyn Repository, MemoryRepository>().unwrap();
        container
            .register_factory::<Handler, _>(Lifetime::Transient, |c| {
                Ok(Arc::new(Handler {
                    repository: c.resolve()?,
                }))
            })
            .unwrap();

        let handler = container.resolve::<Handler>().unwrap();
        assert_eq!(handler.repository.name(), "memory");
    }

    #[test]
    fn test_failed_singleton_is_retried() {
        static ATTEMPTS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container
            .register_factory::<dyn Repository, _>(Lifetime::Singleton, |_| {
                if ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(DiError::creation_failed::<dyn Repository>("warming up"))
                } else {
                    Ok(Arc::new(MemoryRepository) as Arc<dyn Repository>)
                }
            })
            .unwrap();

        assert!(container.resolve::<dyn Repository>().is_err());
        assert!(!container.is_cached::<dyn Repository>());

        let r1 = container.resolve::<dyn Repository>().unwrap();
        let r2 = container.resolve::<dyn Repository>().unwrap();
        assert!(Arc::ptr_eq(&r1, &r2));
        assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
    }

    // Cycles: Ping -> Pong -> Ping
    #[derive(Debug)]
    struct Ping;
    #[derive(Debug)]
    struct Pong;

    impl Component for Ping {
        type Dependencies = Arc<Pong>;

        fn construct(_: Arc<Pong>) -> Self {
            Ping
        }
    }

    impl Component for Pong {
        type Dependencies = Arc<Ping>;

        fn construct(_: Arc<Ping>) -> Self {
            Pong
        }
    }

    #[test]
    fn test_circular_dependency_transient() {
        let container = Container::new();
        container.transient::<Ping, Ping>().unwrap();
        container.transient::<Pong, Pong>().unwrap();

        match container.resolve::<Ping>().unwrap_err() {
            DiError::CircularDependency { type_name, path } => {
                assert!(type_name.ends_with("Ping"));
                assert_eq!(path.matches(" -> ").count(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Guard unwound: an unrelated resolve on this thread still works
        container.transient::<dyn Repository, MemoryRepository>().unwrap();
        assert!(container.resolve::<dyn Repository>().is_ok());
    }

    #[test]
    fn test_circular_dependency_singleton_does_not_deadlock() {
        let container = Container::new();
        container.singleton::<Ping, Ping>().unwrap();
        container.singleton::<Pong, Pong>().unwrap();

        let err = container.resolve::<Pong>().unwrap_err();
        assert!(matches!(err, DiError::CircularDependency { .. }));
        assert!(!container.is_cached::<Ping>());
        assert!(!container.is_cached::<Pong>());
    }

    #[test]
    fn test_self_dependency() {
        #[derive(Debug)]
        struct Ouroboros;

        impl Component for Ouroboros {
            type Dependencies = Arc<Ouroboros>;

            fn construct(_: Arc<Ouroboros>) -> Self {
                Ouroboros
            }
        }

        let container = Container::new();
        container.transient::<Ouroboros, Ouroboros>().unwrap();

        match container.resolve::<Ouroboros>().unwrap_err() {
            DiError::CircularDependency { path, .. } => {
                assert_eq!(path.matches(" -> ").count(), 1)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_service_from_two_containers_is_not_a_cycle() {
        let inner = Container::new();
        inner.transient::<dyn Repository, MemoryRepository>().unwrap();

        let outer = Container::new();
        let source = inner.clone();
        outer
            .register_factory::<dyn Repository, _>(Lifetime::Transient, move |_| {
                source.resolve::<dyn Repository>()
            })
            .unwrap();

        assert_eq!(outer.resolve::<dyn Repository>().unwrap().name(), "memory");
    }

    #[test]
    fn test_debug_output() {
        let container = Container::new();
        container.singleton::<dyn Repository, MemoryRepository>().unwrap();
        container.resolve::<dyn Repository>().unwrap();

        let debug = format!("{container:?}");
        assert!(debug.contains("service_count: 1"));
        assert!(debug.contains("singletons_created: 1"));
    }
}
