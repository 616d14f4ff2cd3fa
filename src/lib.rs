//! postflow - workflow graph generator and validator
//!
//! postflow builds declarative automation graphs that react to newly posted
//! content: one trigger, a set of actions, and the edges wiring them. Graphs
//! come from parameterized templates or from hand-written JSON/YAML, and are
//! checked for structural soundness before being handed to the platform
//! that runs them.
//!
//! ## Example
//!
//! ```
//! use postflow::templates::sentiment_filter;
//! use postflow::workflow::validate;
//!
//! let graph = sentiment_filter("#wins", "#review");
//! let report = validate(&graph);
//! assert!(report.valid, "{:?}", report.errors);
//! assert_eq!(graph.actions.len(), 4);
//! ```

pub mod config;
pub mod error;
pub mod templates;
pub mod workflow;

pub use error::{Error, Result};
