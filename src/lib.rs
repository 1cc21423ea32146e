//! Node-based workflow engine for a generative content studio.
//!
//! A workflow is a DAG of typed nodes: the catalog declares what each
//! node kind looks like (sockets, defaults, operation), the graph module
//! holds the editable document, the runtime executes it with
//! dependency-ordered concurrency, and the store/transfer modules persist
//! and exchange the serialized definition.

pub mod catalog;
pub mod error;
pub mod graph;
pub mod ops;
pub mod runtime;
pub mod store;
pub mod transfer;
pub mod workbench;
