//! # Dispatch Service
//!
//! Runs the [`dispatch_core`] primitives as a service.
//!
//! ## Components
//!
//! - **[actor]**: the [`DispatchActor`](actor::DispatchActor), which sequences every
//!   workflow that touches both the ranking queue and the lifecycle tracker.
//! - **[client]**: [`DispatchClient`](client::DispatchClient), the async API the
//!   order-management layer calls.
//! - **[worker]**: dispatch workers that offer the top order to free couriers and claim it.
//! - **[courier]** / **[archive]**: the outside world, behind traits.
//! - **[runtime]**: [`DispatchSystem`](runtime::DispatchSystem) wiring and tracing setup.
//! - **[config]**: TOML configuration.
//!
//! ## Testing
//!
//! See [`mock`] for a scriptable client and courier gateway.

pub mod actor;
pub mod archive;
pub mod client;
pub mod config;
pub mod courier;
pub mod error;
pub mod message;
pub mod mock;
pub mod runtime;
pub mod worker;
