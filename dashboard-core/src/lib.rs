//! Data loading and view logic for the agents / PRDs dashboard.
//!
//! Nothing here touches a browser or a socket directly: transports plug in
//! through [`client::HttpGet`], and hosts drive a [`machine::DashboardMachine`]
//! and render whatever [`render::render`] returns.

pub mod client;
pub mod error;
pub mod machine;
pub mod model;
pub mod observer;
pub mod probe;
pub mod projection;
pub mod render;

#[cfg(test)]
mod testing;

pub use client::{fetch_collection, Endpoint, FetchOutcome, HttpGet, HttpReply, AGENTS, PRDS};
pub use error::{FetchFailure, TransportFault};
pub use machine::{
    load_both, run_cycle, DashboardEndpoints, DashboardMachine, DashboardState, FetchTicket, Phase,
};
pub use model::{Agent, Collection, Prd, PrdType};
pub use observer::{NoopObserver, TracingObserver, Transition, TransitionObserver};
