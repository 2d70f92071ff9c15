//! pcbook: a small laptop catalog service.
//!
//! Clients create laptops and search them by price, CPU and RAM over a
//! length-prefixed TCP protocol.
//!
//! ```text
//! client ──► server ──► LaptopService ──► LaptopStore
//!                            │                 │
//!                            └── filter ◄──────┘
//! ```
//!
//! The store is volatile and owned by whoever builds the service; nothing
//! here is a process-wide singleton.

pub mod client;
pub mod context;
pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod protocol;
pub mod sample;
pub mod serializer;
pub mod server;
pub mod service;
pub mod storage;

pub use context::RequestContext;
pub use error::{ServiceError, StatusCode, StoreError};
pub use model::{Filter, Laptop, Memory, MemoryUnit};
pub use service::LaptopService;
pub use storage::{InMemoryLaptopStore, LaptopSink, LaptopStore};
