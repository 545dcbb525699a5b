//! Airspace Environment Abstraction Layer
//!
//! This crate provides the clock abstraction that lets the airspace
//! agents and the conflict monitor run against **Production** time
//! (tokio) or a **Simulated** virtual clock in tests.
//!
//! # Core Concept
//!
//! Every periodic task in the simulator needs exactly two things from
//! the outside world:
//! - Time (`now()`, `system_time()`)
//! - Suspension between ticks (`sleep()`)
//!
//! Routing both through one trait keeps tick loops identical between a
//! real run and a deterministic test.
//!
//! # Example
//!
//! ```ignore
//! use airspace_env::{AirspaceContext, TokioContext};
//!
//! async fn tick_loop<Ctx: AirspaceContext>(ctx: &Ctx) {
//!     loop {
//!         ctx.sleep(Duration::from_secs(1)).await;
//!         tick();
//!     }
//! }
//! ```

mod context;
mod tokio_impl;

pub use context::AirspaceContext;
pub use tokio_impl::TokioContext;
