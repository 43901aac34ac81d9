//! # Stockroom Engine
//!
//! The core of a small product catalogue: request validation, a pluggable
//! record store with filtering and sorting, and the business rules that sit
//! between them.
//!
//! ## Design Principles
//!
//! - **No network IO**: the HTTP layer lives in `stockroom-server`
//! - **One response shape**: every operation answers with an [`Envelope`]
//! - **Pluggable storage**: the service talks to the [`Store`] trait
//! - **Explicit state**: stores are constructed and seeded by the caller
//!
//! ## Core Concepts
//!
//! ### Request schemas
//!
//! A [`RequestSchema`] lists the parameters an operation accepts, each
//! required or optional with a [`FieldKind`]. Validation stops at the first
//! failing field and produces [`ValidationErrors`].
//!
//! ### Store
//!
//! Records live in named collections. The store allocates sequential ids,
//! stamps `created_at` on insert, merges partial updates, and answers
//! [`FindQuery`] scans. A filter value containing `%` matches as a
//! case-insensitive pattern; any other value matches exactly.
//!
//! ### Service
//!
//! [`ProductService`] enforces non-empty names, positive prices and
//! non-negative stock, then calls the store and builds the envelope.
//!
//! ## Quick Start
//!
//! ```rust
//! use stockroom_engine::{api, product, MemoryStore, ProductService};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::seeded(
//!     product::COLLECTION,
//!     product::sample_products(),
//! ));
//! let service = ProductService::new(store);
//!
//! let body = json!({"name": "Keyboard", "price": 149.99, "stock": 30});
//! let request = api::Request::new(
//!     Default::default(),
//!     body.as_object().cloned().unwrap(),
//! );
//!
//! let envelope = api::dispatch(&service, api::Operation::Create, &request);
//! assert_eq!(envelope.response_code, 201);
//! assert_eq!(envelope.data["id"], 4);
//! ```

pub mod api;
pub mod error;
pub mod locks;
pub mod product;
pub mod record;
pub mod response;
pub mod schema;
pub mod service;
pub mod store;

// Re-export main types at crate root
pub use error::Error;
pub use locks::RecordLocks;
pub use product::{ListQuery, NewProduct, Product, ProductPatch};
pub use record::{Fields, Record};
pub use response::{status, Envelope};
pub use schema::{FieldDef, FieldKind, Params, RequestSchema, Source, ValidationErrors};
pub use service::{ProductService, RuleViolation};
pub use store::{Collection, FindQuery, MemoryStore, Store};

/// Type aliases for clarity
pub type RecordId = u64;
pub type CollectionName = String;
