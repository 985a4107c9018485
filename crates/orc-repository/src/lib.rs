// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory reference implementation of every repository contract the
//! execution core's crates inject.
//!
//! [`InMemoryStore`] implements `orc-catalog::CatalogRepository`,
//! `orc-policy::{AccessRuleSource, StateVersionSource}`,
//! `orc-module::{ModuleRepository, FederatedRegistryRepository}`, and
//! `orc-runstate::{RunRepository, VariableSource, JobSource}`,
//! `orc-dispatch::{JobRepository, LogSource}` over a handful of
//! `Mutex<HashMap<Id, T>>` tables. It exists to back integration tests and
//! a single-process deployment; a production deployment is expected to
//! swap it for a real database-backed implementation of the same traits.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod dispatch;
mod module;
mod policy;
mod runstate;
/// The shared in-memory tables and their compare-and-swap helper.
pub mod store;

pub use store::InMemoryStore;
