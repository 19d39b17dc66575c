//! Example demonstrating the #[derive(Component)] macro
//!
//! Run with:
//!   cargo run --example derive --features derive

use idiocy::{Component, Container, DiError};
use std::sync::Arc;

// Contracts
trait Database: Send + Sync {
    fn url(&self) -> &str;
}

trait Cache: Send + Sync {
    fn size(&self) -> usize;
}

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

// Components
#[derive(Component)]
#[provides(dyn Database)]
struct Postgres;

impl Database for Postgres {
    fn url(&self) -> &str {
        "postgres://localhost:5432/myapp"
    }
}

#[derive(Component)]
#[provides(dyn Cache)]
struct LruCache;

impl Cache for LruCache {
    fn size(&self) -> usize {
        1024
    }
}

// Service with injected dependencies
#[derive(Component)]
struct UserService {
    #[inject]
    db: Arc<dyn Database>,
    #[inject]
    cache: Arc<dyn Cache>,
    #[inject(optional)]
    logger: Option<Arc<dyn Logger>>,
    // Non-injected field uses Default
    request_count: u64,
}

impl UserService {
    fn describe(&self) -> String {
        let logger_status = if self.logger.is_some() {
            "with logging"
        } else {
            "without logging"
        };
        format!(
            "UserService connected to {} with cache size {} ({}, requests: {})",
            self.db.url(),
            self.cache.size(),
            logger_status,
            self.request_count
        )
    }
}

// Nested injection example
#[allow(dead_code)]
#[derive(Component)]
struct ApiController {
    #[inject]
    user_service: Arc<UserService>,
    #[inject]
    db: Arc<dyn Database>,
}

fn main() -> Result<(), DiError> {
    println!("=== Idiocy Derive Macro Demo ===\n");

    let container = Container::new();
    container.singleton::<dyn Database, Postgres>()?;
    container.singleton::<dyn Cache, LruCache>()?;
    // Note: Logger is NOT registered, so it will be None
    container.transient::<UserService, UserService>()?;
    container.transient::<ApiController, ApiController>()?;
    container.lock();

    println!("Resolving UserService...");
    let user_service = container.resolve::<UserService>()?;
    println!("  {}\n", user_service.describe());

    println!("Resolving ApiController (UserService injected transitively)...");
    let controller = container.resolve::<ApiController>()?;
    println!(
        "  Controller shares the Database singleton: {}",
        Arc::ptr_eq(&controller.db, &user_service.db)
    );
    println!(
        "  Controller got a fresh UserService: {}\n",
        !Arc::ptr_eq(&controller.user_service, &user_service)
    );

    println!("Dependencies of ApiController, in resolution order:");
    for id in ApiController::dependency_ids() {
        println!("  - {id}");
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
