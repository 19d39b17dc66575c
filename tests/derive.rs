#![cfg(feature = "derive")]

use idiocy::{Component, Container, DiError, Lifetime, ServiceId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

trait IService: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Component)]
#[provides(dyn IService)]
struct ServiceComponent;

impl IService for ServiceComponent {
    fn name(&self) -> &'static str {
        "service"
    }
}

trait IServiceWithParams: Send + Sync {
    fn service(&self) -> &Arc<dyn IService>;
}

#[derive(Component)]
#[provides(dyn IServiceWithParams)]
struct ComponentWithParams {
    #[inject]
    service: Arc<dyn IService>,
}

impl IServiceWithParams for ComponentWithParams {
    fn service(&self) -> &Arc<dyn IService> {
        &self.service
    }
}

#[test]
fn resolves_derived_component() {
    let container = Container::new();
    container.transient::<dyn IService, ServiceComponent>().unwrap();

    let service = container.resolve::<dyn IService>().unwrap();
    assert_eq!(service.name(), "service");
}

#[test]
fn injects_constructor_dependency() {
    let container = Container::new();
    container.transient::<dyn IService, ServiceComponent>().unwrap();
    container
        .transient::<dyn IServiceWithParams, ComponentWithParams>()
        .unwrap();

    let component = container.resolve::<dyn IServiceWithParams>().unwrap();
    assert_eq!(component.service().name(), "service");
    assert_eq!(
        ComponentWithParams::dependency_ids(),
        vec![ServiceId::of::<dyn IService>()]
    );
}

#[test]
fn missing_dependency_is_reported() {
    let container = Container::new();
    container
        .transient::<dyn IServiceWithParams, ComponentWithParams>()
        .unwrap();

    match container.resolve::<dyn IServiceWithParams>() {
        Err(DiError::NotRegistered { service, .. }) => {
            assert_eq!(service, ServiceId::of::<dyn IService>())
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("resolved without its dependency"),
    }
}

trait Audit: Send + Sync {}

#[derive(Component)]
#[provides(dyn Audit)]
struct NullAudit;

impl Audit for NullAudit {}

static REPORTS_BUILT: AtomicU32 = AtomicU32::new(0);

struct Counter;

impl Default for Counter {
    fn default() -> Self {
        REPORTS_BUILT.fetch_add(1, Ordering::SeqCst);
        Counter
    }
}

#[derive(Component)]
struct Report {
    #[inject]
    service: Arc<dyn IService>,
    #[inject(optional)]
    audit: Option<Arc<dyn Audit>>,
    pages: u32,
    _counter: Counter,
}

#[test]
fn optional_and_default_fields() {
    let container = Container::new();
    container.singleton::<dyn IService, ServiceComponent>().unwrap();
    container.transient::<Report, Report>().unwrap();

    let report = container.resolve::<Report>().unwrap();
    assert!(report.audit.is_none());
    assert_eq!(report.pages, 0);
    assert_eq!(report.service.name(), "service");

    container.transient::<dyn Audit, NullAudit>().unwrap();
    let report = container.resolve::<Report>().unwrap();
    assert!(report.audit.is_some());

    assert_eq!(REPORTS_BUILT.load(Ordering::SeqCst), 2);
    assert_eq!(
        Report::dependency_ids(),
        vec![ServiceId::of::<dyn IService>(), ServiceId::of::<dyn Audit>()]
    );
}

trait Reader: Send + Sync {}
trait Writer: Send + Sync {}

#[derive(Component)]
#[provides(dyn Reader, dyn Writer)]
struct Disk {
    blocks: u64,
}

impl Reader for Disk {}
impl Writer for Disk {}

#[test]
fn one_component_provides_several_services() {
    let container = Container::new();
    container
        .register::<dyn Reader, Disk>(Lifetime::Singleton)
        .unwrap();
    container
        .register::<dyn Writer, Disk>(Lifetime::Singleton)
        .unwrap();
    container.register::<Disk, Disk>(Lifetime::Transient).unwrap();

    assert!(container.resolve::<dyn Reader>().is_ok());
    assert!(container.resolve::<dyn Writer>().is_ok());
    assert_eq!(container.resolve::<Disk>().unwrap().blocks, 0);
}
