//! Flow Engine - compile node graphs into cancellable async runs
//!
//! A host authors a graph of nodes joined by typed ports. At run time each
//! node contributes a flow token; tokens form a tree linked by successors
//! (the next step of a branch) and children (nested branches). A producer
//! compiles that tree into a single awaitable unit that performs the
//! graph's side effects in order, while nodes pull their input values
//! lazily from upstream through the connection graph.
//!
//! # Architecture
//!
//! - `types`, `validation`, `builder`: the graph model and the rules every
//!   connection must satisfy
//! - `dataflow`: `GraphModel`, `NodeContext` and pull-based value reads
//! - `token`, `accumulator`, `unit`: the token tree, the per-pass unit
//!   buffer and the schedulable unit itself
//! - `producer`: the linear, hierarchical and immediate strategies
//! - `engine`: the `FlowEngine` facade and spawned `RunHandle`s
//! - `events`: `EventSink` and the `FlowEvent` side channel
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flow_engine::{FlowConfig, FlowEngine, ProducerKind};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = FlowEngine::with_config(FlowConfig::with_producer(ProducerKind::Immediate));
//! engine.execute(Arc::new(tree), &CancellationToken::new()).await?;
//! ```

pub mod accumulator;
pub mod builder;
pub mod config;
pub mod dataflow;
pub mod engine;
pub mod error;
pub mod events;
pub mod producer;
pub mod token;
pub mod types;
pub mod unit;
pub mod validation;

// Re-export key types
pub use accumulator::{AccumulatedUnit, FlowAccumulator};
pub use builder::GraphBuilder;
pub use config::{FlowConfig, ProducerKind};
pub use dataflow::{GraphModel, NodeContext, NodeToken};
pub use engine::{FlowEngine, RunHandle};
pub use error::{FlowError, Result};
pub use events::{EventError, EventSink, FlowEvent, NullEventSink, VecEventSink};
pub use producer::{
    producer_for, FlowPlan, FlowProducer, HierarchicalProducer, ImmediateProducer, ImmediateRun,
    LinearProducer,
};
pub use token::{FlowToken, FnToken, TokenId, TokenTree};
pub use types::{
    Connection, FlowGraph, GraphNode, NodeId, PortCapacity, PortDataType, PortDefinition,
    PortDirection, PortId, PortValue,
};
pub use unit::{unit_fn, BoxedUnit, FlowUnit, FnUnit};
pub use validation::{validate_connection, validate_graph, ValidationError};

// Hosts implementing units need the cancellation token type
pub use tokio_util::sync::CancellationToken;
