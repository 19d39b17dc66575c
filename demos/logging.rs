//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use idiocy::{Component, Container, Lifetime, upcast};
use std::sync::Arc;

trait Database: Send + Sync {}

struct Postgres;

impl Database for Postgres {}

impl Component for Postgres {
    type Dependencies = ();

    fn construct(_: ()) -> Self {
        println!("  [App] Connecting to database...");
        Postgres
    }
}

upcast!(Postgres => dyn Database);

#[allow(dead_code)]
struct UserService {
    db: Arc<dyn Database>,
}

impl Component for UserService {
    type Dependencies = Arc<dyn Database>;

    fn construct(db: Arc<dyn Database>) -> Self {
        UserService { db }
    }
}

// Self-referencing pair, to show the cycle diagnostics
struct Left;
struct Right;

impl Component for Left {
    type Dependencies = Arc<Right>;

    fn construct(_: Arc<Right>) -> Self {
        Left
    }
}

impl Component for Right {
    type Dependencies = Arc<Left>;

    fn construct(_: Arc<Left>) -> Self {
        Right
    }
}

fn main() {
    // Uses JSON if logging-json is enabled, pretty if logging-pretty is enabled
    idiocy::logging::builder().trace().container_only().init();

    println!("=== Idiocy Logging Demo ===\n");

    // Logs: "Creating new IoC container"
    let container = Container::new();

    // Logs: "Registered service"
    container.singleton::<dyn Database, Postgres>().unwrap();
    container.transient::<UserService, UserService>().unwrap();
    container
        .register_factory::<String, _>(Lifetime::Transient, |_| Ok(Arc::new("req-12345".into())))
        .unwrap();

    // Logs: "Rejected duplicate registration"
    let duplicate = container.transient::<dyn Database, Postgres>();
    println!("Duplicate registration: {}\n", duplicate.unwrap_err());

    // Logs: "Resolving service", "Singleton initializing on first access",
    // "Activating component"
    let _users = container.resolve::<UserService>().unwrap();

    // Logs: "Singleton already initialized, returning cached instance"
    let _again = container.resolve::<UserService>().unwrap();
    let _request_id = container.resolve::<String>().unwrap();

    // Logs: "Service not registered"
    assert!(container.resolve::<i32>().is_err());
    assert!(container.try_resolve::<i32>().unwrap().is_none());

    // Logs: "Circular dependency detected"
    container.transient::<Left, Left>().unwrap();
    container.transient::<Right, Right>().unwrap();
    if let Err(err) = container.resolve::<Left>() {
        println!("Cycle: {err}\n");
    }

    // Logs: "Container locked - no further registrations allowed"
    container.lock();

    println!("{container:?}");
    println!("\n=== Demo Complete ===");
}
