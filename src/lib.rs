//! In-memory order-delivery scheduler.
//!
//! Accepts a stream of commands (create, cancel, reschedule, query) against a
//! population of orders, assigns each order a synthetic priority, and keeps
//! every order's ETA consistent with the ETAs of the orders ahead of it.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Order`, `Command`, `Event`
//! - **`index`**: Generic AVL tree plus the `PriorityIndex` and `EtaIndex`
//! - **`scheduler`**: `SchedulerEngine` (priority repair, ETA cascade,
//!   delivery sweep) and `SchedulerConfig`
//! - **`parser`**: Command script grammar
//! - **`validation`**: Script checks and engine invariant checks
//!
//! # Architecture
//!
//! Single-threaded and run-to-completion: each command, including its
//! cascade and delivery sweep, finishes before the next one starts. Sharing
//! an engine across threads needs one lock around the whole engine, since a
//! single command touches both indexes.
//!
//! # References
//!
//! - Adelson-Velsky & Landis (1962), "An algorithm for the organization of information"
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 12-13

pub mod error;
pub mod index;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod validation;

pub use error::{ParseError, ParseErrorKind, SchedulerError};
