//! # st-oracles
//!
//! Deterministic black-box functions consumed by SafeTL pools.
//!
//! Oracles only return ground truth; observation noise is drawn by the pool
//! that wraps them, using the standard deviation the oracle reports.

mod branin;
mod oracle;

pub use branin::BraninHoo;
pub use oracle::{FunctionOracle, Oracle};
