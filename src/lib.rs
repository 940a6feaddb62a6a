//! Linode Bindings - typed access to the Linode v3 API.
//!
//! A library for managing Linode cloud resources with:
//! - **Linodes**: create, clone, resize, boot, reboot and shut down servers
//! - **Disks & configuration profiles**: deploy distributions and stackscripts
//! - **Jobs**: wait for asynchronous operations to finish
//! - **DNS**: zones and their records
//! - **NodeBalancers**: balancers, their ports and backend nodes
//! - **Catalogue lookups**: datacenters, kernels, distributions and plans
//!
//! ## Quick Start
//!
//! The API key is read from the environment (a `.env` file works) or from
//! `etc/linode.yml` / `~/.linode.yml`:
//!
//! ```text
//! LINODE_API_KEY=your_api_key_here
//! ```
//!
//! Then look resources up and act on them:
//!
//! ```ignore
//! use linode_bindings::{Criteria, Linode, LinodeApi, LinodeSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = LinodeApi::new(LinodeSettings::load()?)?;
//!
//!     let linode = api.find::<Linode>(Criteria::new().with("label", "web1")).await?;
//!     let mut job = linode.reboot(&api, None).await?;
//!     job.wait_default(&api).await?;
//!
//!     for disk in linode.disks(&api).await? {
//!         println!("{disk}");
//!     }
//!     Ok(())
//! }
//! ```

// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy for strict discipline
#![deny(clippy::all)]                 // All standard Clippy lints
#![deny(clippy::pedantic)]            // Very strict Clippy lints
#![deny(clippy::nursery)]             // Experimental lints
#![deny(clippy::unwrap_used)]         // unwrap() is forbidden
#![deny(clippy::expect_used)]         // expect() is forbidden
#![deny(clippy::panic)]               // panic!() is forbidden
#![deny(clippy::print_stdout)]        // println!() is forbidden in production
#![deny(clippy::todo)]                // TODO is forbidden
#![deny(clippy::unimplemented)]       // unimplemented!() is forbidden
#![deny(clippy::missing_const_for_fn)] // Force const when possible
#![deny(clippy::unwrap_in_result)]    // unwrap() in Result is forbidden
#![deny(clippy::module_inception)]    // Module with same name as crate is forbidden
#![deny(clippy::redundant_clone)]     // Useless clones are forbidden
#![deny(clippy::shadow_unrelated)]    // Shadowing unrelated variables is forbidden
#![deny(clippy::too_many_arguments)]  // Limit function arguments
#![deny(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Core
// ============================================================================

/// Error type shared by every operation.
pub mod linode_error;

/// API key, endpoint and HTTP settings from the environment or YAML files.
pub mod linode_settings;

/// Remote actions and the HTTP transport carrying them.
///
/// Use this module to plug a different transport into [`LinodeApi`].
pub mod linode_transport;

/// The API handle passed to every operation.
pub mod linode_client;

/// Dynamic attribute values and their wire conversions.
pub mod linode_value;

/// Resource definitions and entities.
pub mod linode_model;

/// Rule-based reader for open payloads.
pub mod linode_reader;

/// Listing, searching and fetching entities.
pub mod linode_finder;

/// Saving, deleting and creating entities.
pub mod linode_saver;

// ============================================================================
// Resources
// ============================================================================

/// Asynchronous jobs and waiting on them.
pub mod linode_job;

/// Datacenters.
pub mod linode_datacenter;

/// Kernels.
pub mod linode_kernel;

/// Distributions.
pub mod linode_distribution;

/// Plans.
pub mod linode_plan;

/// Linodes and their IP addresses.
///
/// Use this module to create servers and run lifecycle actions on them.
pub mod linode_instance;

/// Disks.
pub mod linode_disk;

/// Configuration profiles.
pub mod linode_boot_config;

/// DNS zones and records.
pub mod linode_dns;

/// NodeBalancers, their configurations and nodes.
pub mod linode_nodebalancer;

/// Stackscripts and their deployment input.
pub mod linode_stackscript;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use linode_boot_config::{LinodeConfig, LinodeConfigCreate};
pub use linode_client::LinodeApi;
pub use linode_datacenter::Datacenter;
pub use linode_disk::{CreatedDisk, Disk, DiskCreate};
pub use linode_distribution::Distribution;
pub use linode_dns::{Domain, Record, RecordCreate};
pub use linode_error::{ApiFault, LinodeError};
pub use linode_finder::{Criteria, Finder};
pub use linode_instance::{IpAddress, Linode};
pub use linode_job::{Job, JobStatus};
pub use linode_kernel::Kernel;
pub use linode_model::{Entity, Resource};
pub use linode_nodebalancer::{Nodebalancer, NodebalancerConfig, NodebalancerNode};
pub use linode_plan::Plan;
pub use linode_settings::LinodeSettings;
pub use linode_stackscript::{Stackscript, StackscriptCreate, StackscriptInput};
pub use linode_transport::{Action, HttpTransport, Transport};
pub use linode_value::AttrValue;
