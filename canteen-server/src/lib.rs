//! Canteen Server - pre-order fulfillment and locker pickup
//!
//! # Architecture Overview
//!
//! - **orders**: the order state machine (create, pay, ready, claim, expire)
//! - **lockers**: race-free locker cell assignment and release
//! - **pickup**: credential issuing and the claim protocol
//! - **catalog**: daily menus and the availability check
//! - **store**: embedded redb persistence
//! - **api**: HTTP routes and handlers
//!
//! # Module Structure
//!
//! ```text
//! canteen-server/src/
//! ├── core/          # configuration, state, HTTP server
//! ├── api/           # HTTP routes and handlers
//! ├── orders/        # order state machine
//! ├── lockers.rs     # locker pool
//! ├── pickup.rs      # credentials + claim resolver
//! ├── catalog.rs     # menu availability
//! ├── store/         # redb storage layer
//! └── utils/         # response plumbing, logging
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod lockers;
pub mod orders;
pub mod pickup;
pub mod store;
pub mod utils;

// Re-export public types
pub use catalog::CatalogService;
pub use core::{Config, PickupPolicy, Server, ServerState};
pub use orders::OrderManager;
pub use store::CanteenStore;
pub use utils::{ApiError, ApiResult, AppResponse};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load .env and initialize logging
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_logger();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______            __
  / ____/___ _____  / /____  ___  ____
 / /   / __ `/ __ \/ __/ _ \/ _ \/ __ \
/ /___/ /_/ / / / / /_/  __/  __/ / / /
\____/\__,_/_/ /_/\__/\___/\___/_/ /_/
    "#
    );
}
