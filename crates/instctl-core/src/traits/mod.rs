//! Core traits for the instance control plane
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ComputeProvider`]: Instance lifecycle and static-IP calls
//! - [`DnsProvider`]: Zone lookup and A record rewrites

pub mod compute_provider;
pub mod dns_provider;

pub use compute_provider::{
    ComputeProvider, ComputeProviderFactory, Instance, InstanceStatus, Operation,
    ResourceLocation, StaticIp,
};
pub use dns_provider::{AUTOMATIC_TTL, DnsProvider, DnsProviderFactory, DnsRecord};
