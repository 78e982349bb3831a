//! Simulation loop tests
//!
//! All tests run against the in-memory broker under a paused tokio clock, so
//! the loop's sleeps advance virtual time instantly and deterministically.

mod helpers;
mod lifecycle;
mod scenarios;
