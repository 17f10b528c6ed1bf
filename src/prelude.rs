//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! trellis crate. Import this module to get access to the core functionality
//! without having to import each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use trellis::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let mut registry = StaticRegistry::default();
//! registry.add_table(
//!     TableRef::new("shop", "orders"),
//!     Schema::from_pairs([("id", SemanticType::Integer), ("total", SemanticType::Float)]),
//!     1_000,
//! );
//!
//! let mut graph = WorkflowGraph::default();
//! let input = graph.add_node(NodeKind::Input(InputConfig {
//!     table: TableRef::new("shop", "orders"),
//! }));
//! let output = graph.add_node(NodeKind::Output(OutputConfig { table_name: None }));
//! graph.connect(input, output, 0)?;
//!
//! let expr = Compiler::new(&graph, &registry).compile(output)?;
//! println!("{}", expr.compile_to_sql());
//! # Ok(())
//! # }
//! ```

// Core compilation
pub use crate::compiler::Compiler;
pub use crate::rel::{RelExpr, RelOp, ScalarExpr};

// Graph construction
pub use crate::graph::node::{InputConfig, NodeKind, OutputConfig};
pub use crate::graph::{Node, NodeId, WorkflowGraph};

// Schemas and tables
pub use crate::schema::{Column, Schema, SemanticType, Table, TableRef, TableSource};

// Backend seams
pub use crate::backend::{SchemaRegistry, StaticRegistry, Warehouse};

// Scheduling
pub use crate::scheduler::{
    run_project, EntityId, EntityRun, GraphRun, Integration, Project, Workflow,
};

// Date-range slicing
pub use crate::daterange::DateRange;

// Error types
pub use crate::error::{CompileError, CycleError, GraphError, RunError, ScheduleError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
