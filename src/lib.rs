//! thread-order
//!
//! Keeps the entries of every rendered thread view in the order chosen by a
//! single persisted preference: ascending by entry id (oldest first) or
//! reversed (newest first). Each view carries a two-item toggle; a click in
//! any view rewrites the preference and every view follows.
//!
//! Layout follows a pure core / impure shell split:
//! - [`ordering`] computes target orders and never touches the host,
//! - [`host`] and [`store`] are the seams to the page and to storage,
//! - [`sync`], [`control`] and [`discovery`] wire them together on a
//!   single-threaded executor.

pub mod config;
pub mod control;
pub mod discovery;
pub mod host;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_harness;
