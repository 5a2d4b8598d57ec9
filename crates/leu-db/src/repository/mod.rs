//! # Repository Module
//!
//! Typed access to document collections.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VisitService                                                          │
//! │       │                                                                 │
//! │       │  customers.get_versioned(id)                                   │
//! │       │  customers.update_if_version(id, v, update)                    │
//! │       ▼                                                                 │
//! │  CustomerRepository                                                    │
//! │  ├── Customer ⇄ document body mapping                                  │
//! │  └── field names, timestamp encoding                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Arc<dyn DocumentStore>  (SQLite or in-memory)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - the `clientes` collection

pub mod customer;
