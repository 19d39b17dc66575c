#![no_main]

//! Fuzz target for basic container operations
//!
//! Registration, resolution and locking checked against a simple model of
//! which services are registered.

use arbitrary::Arbitrary;
use idiocy::{Component, Container, DiError, Lifetime};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Clone, Debug, Arbitrary)]
struct Settings {
    enabled: bool,
    timeout_ms: u32,
    tags: Vec<String>,
}

struct Store {
    settings: Arc<Settings>,
}

impl Component for Store {
    type Dependencies = Arc<Settings>;

    fn construct(settings: Arc<Settings>) -> Self {
        Store { settings }
    }
}

struct Session {
    store: Arc<Store>,
}

impl Component for Session {
    type Dependencies = Arc<Store>;

    fn construct(store: Arc<Store>) -> Self {
        Session { store }
    }
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Life {
    Transient,
    Singleton,
}

impl From<Life> for Lifetime {
    fn from(life: Life) -> Self {
        match life {
            Life::Transient => Lifetime::Transient,
            Life::Singleton => Lifetime::Singleton,
        }
    }
}

/// Operations to perform on the container
#[derive(Debug, Arbitrary)]
enum ContainerOp {
    RegisterSettings(Settings),
    RegisterStore(Life),
    RegisterSession(Life),
    ResolveSettings,
    ResolveStore,
    ResolveSession,
    TryResolveSession,
    Lock,
    Len,
}

/// Which services are registered, and with what lifetime
#[derive(Default)]
struct Model {
    settings: bool,
    store: Option<Lifetime>,
    session: Option<Lifetime>,
    locked: bool,
}

fn check_registration(result: idiocy::Result<()>, already: bool, locked: bool) -> bool {
    match result {
        Ok(()) => {
            assert!(!already && !locked);
            true
        }
        Err(DiError::Locked) => {
            assert!(locked);
            false
        }
        Err(DiError::AlreadyRegistered { .. }) => {
            assert!(already && !locked);
            false
        }
        Err(other) => panic!("unexpected registration error: {other}"),
    }
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();
    let mut model = Model::default();

    for op in ops {
        match op {
            ContainerOp::RegisterSettings(settings) => {
                let result = container.register_instance(Arc::new(settings));
                if check_registration(result, model.settings, model.locked) {
                    model.settings = true;
                }
            }
            ContainerOp::RegisterStore(life) => {
                let result = container.register::<Store, Store>(life.into());
                if check_registration(result, model.store.is_some(), model.locked) {
                    model.store = Some(life.into());
                }
            }
            ContainerOp::RegisterSession(life) => {
                let result = container.register::<Session, Session>(life.into());
                if check_registration(result, model.session.is_some(), model.locked) {
                    model.session = Some(life.into());
                }
            }
            ContainerOp::ResolveSettings => {
                assert_eq!(container.resolve::<Settings>().is_ok(), model.settings);
            }
            ContainerOp::ResolveStore => {
                let resolvable = model.store.is_some() && model.settings;
                match container.resolve::<Store>() {
                    Ok(store) => {
                        assert!(resolvable);
                        assert!(Arc::ptr_eq(&store.settings, &container.resolve().unwrap()));
                    }
                    Err(err) => {
                        assert!(!resolvable);
                        assert!(err.is_not_registered());
                    }
                }
            }
            ContainerOp::ResolveSession => {
                let resolvable = model.session.is_some() && model.store.is_some() && model.settings;
                match container.resolve::<Session>() {
                    Ok(first) => {
                        assert!(resolvable);
                        let second = container.resolve::<Session>().unwrap();
                        let shared = model.session == Some(Lifetime::Singleton);
                        assert_eq!(Arc::ptr_eq(&first, &second), shared);
                        if model.store == Some(Lifetime::Singleton) {
                            assert!(Arc::ptr_eq(&first.store, &second.store));
                        }
                    }
                    Err(err) => {
                        assert!(!resolvable);
                        assert!(err.is_not_registered());
                    }
                }
            }
            ContainerOp::TryResolveSession => {
                let result = container.try_resolve::<Session>();
                if model.session.is_none() {
                    assert!(matches!(result, Ok(None)));
                }
            }
            ContainerOp::Lock => {
                container.lock();
                model.locked = true;
                assert!(container.is_locked());
            }
            ContainerOp::Len => {
                let expected = usize::from(model.settings)
                    + usize::from(model.store.is_some())
                    + usize::from(model.session.is_some());
                assert_eq!(container.len(), expected);
            }
        }
    }
});
