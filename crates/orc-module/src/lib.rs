// SPDX-License-Identifier: MIT OR Apache-2.0
//! Module resolver (§4.5): classifies a module-source string, runs service
//! discovery against its host, and dispatches to a `Local`, `Federated`, or
//! `Generic` [`ModuleRegistrySource`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod federated;
mod generic;
mod http;
mod local;
mod reference;
mod resolve;
mod source;

pub use federated::FederatedSource;
pub use generic::{EnvReader, GenericSource};
pub use local::LocalSource;
pub use reference::{ParseOutcome, parse_reference};
pub use resolve::{DiscoveryBaseBuilder, ResolveContext, ResolvedSource, default_discovery_base, resolve};
pub use source::{FederatedRegistryRepository, ModuleRegistrySource, ModuleRepository};
