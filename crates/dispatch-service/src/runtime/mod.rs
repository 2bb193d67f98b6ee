//! # Runtime & Orchestration
//!
//! Wires the dispatch core into a running service: one [`DispatchActor`](crate::actor::DispatchActor)
//! owning the multi-step workflows, a pool of [`DispatchWorker`](crate::worker::DispatchWorker)s
//! offering orders to couriers, and the shared queue and tracker between them.
//!
//! ## Shutdown
//!
//! 1. **Signal workers** - flip the watch channel; idle workers wake immediately
//! 2. **Await workers** - each finishes its current step
//! 3. **Drop the client** - the actor's channel closes once no worker holds a clone
//! 4. **Await the actor** - it drains queued requests, then exits
//!
//! Orders still pending at shutdown stay in the queue; nothing is archived for them.

pub mod dispatch_system;
pub mod tracing;

pub use dispatch_system::DispatchSystem;
pub use self::tracing::setup_tracing;
