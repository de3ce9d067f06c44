// # instctl-core
//
// Core library for the instance control plane.
//
// ## Architecture Overview
//
// This library owns everything that is not a provider SDK call or HTTP glue:
// - **ComputeProvider**: Trait for instance and static-IP operations on a cloud account
// - **DnsProvider**: Trait for zone lookup and A record rewrites
// - **RequestParams / TimestampGate**: Parameter presence and freshness checks
// - **workflow**: The ordered static-IP reassignment (release, allocate, attach, lookup)
// - **DnsSync**: Rewrites A records that still point at the released address
// - **InstanceController**: Validates a request, connects a provider, dispatches one action
// - **ProviderRegistry**: Name-keyed factories selected by configuration
//
// ## Design Principles
//
// 1. **Stateless**: Nothing outlives a request except read-only configuration
// 2. **Sequential**: Workflow steps never run concurrently, each depends on the last
// 3. **No rollback**: A failed step reports itself; completed steps stay done
// 4. **Best-effort DNS**: DNS sync failures are logged, never returned to the caller

pub mod config;
pub mod controller;
pub mod dns_sync;
pub mod error;
pub mod registry;
pub mod traits;
pub mod validation;
pub mod workflow;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types for convenience
pub use config::{ComputeConfig, CredentialSource, DnsAccountConfig, DnsProviderConfig, ServiceConfig};
pub use controller::{ActionOutcome, DnsTarget, InstanceController, InstanceSummary};
pub use dns_sync::{DnsSync, SyncReport};
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use traits::{ComputeProvider, ComputeProviderFactory, DnsProvider, DnsProviderFactory};
pub use validation::{InstanceAction, InstanceTarget, RequestParams, TimestampGate};
pub use workflow::{Reassignment, WorkflowStep};
