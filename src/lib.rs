//! # Trellis - Visual Pipeline Compilation and Scheduling Engine
//!
//! **Trellis** turns visual node graphs into relational queries and runs
//! whole projects of them in dependency order. A workflow is a DAG of typed
//! transformation nodes (inputs, joins, filters, aggregations, formulas, …);
//! the compiler walks it bottom-up, propagating a column schema through every
//! node and producing a relational expression that renders to SQL for a
//! warehouse to execute. A project groups workflows with the integrations
//! that feed them, and the scheduler executes the whole set topologically.
//!
//! ## Core Workflow
//!
//! 1.  **Describe your tables**: implement [`backend::SchemaRegistry`] (or
//!     use [`backend::StaticRegistry`]) so the compiler can resolve INPUT
//!     nodes to concrete schemas.
//! 2.  **Build a graph**: create a [`graph::WorkflowGraph`], add nodes with
//!     their configs, and connect them. Structural mistakes (cycles, taken
//!     input positions) are rejected at edit time.
//! 3.  **Compile**: run [`compiler::Compiler`] on any node to get a
//!     [`rel::RelExpr`] carrying the propagated schema, or `compile_to_sql`
//!     for the rendered query. Schema queries are memoized per node and
//!     invalidated by graph edits.
//! 4.  **Schedule**: collect workflows and integrations into a
//!     [`scheduler::Project`] and call [`scheduler::run_project`] to execute
//!     one full pass in topological order, continuing past failures.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trellis::prelude::*;
//! use trellis::graph::node::{FilterConfig, FilterPredicate, SelectConfig, SelectMode};
//! use trellis::rel::{CmpOp, Literal};
//!
//! fn main() -> Result<()> {
//!     // 1. Register the source table the graph will read.
//!     let mut registry = StaticRegistry::default();
//!     registry.add_table(
//!         TableRef::new("shop", "orders"),
//!         Schema::from_pairs([
//!             ("id", SemanticType::Integer),
//!             ("customer", SemanticType::Text),
//!             ("total", SemanticType::Float),
//!         ]),
//!         10_000,
//!     );
//!
//!     // 2. Build a three-node pipeline: read, filter, keep two columns.
//!     let mut graph = WorkflowGraph::default();
//!     let input = graph.add_node(NodeKind::Input(InputConfig {
//!         table: TableRef::new("shop", "orders"),
//!     }));
//!     let filter = graph.add_node(NodeKind::Filter(FilterConfig {
//!         predicate: FilterPredicate::Compare {
//!             column: "total".into(),
//!             op: CmpOp::Gt,
//!             value: Literal::Float(100.0),
//!         },
//!     }));
//!     let select = graph.add_node(NodeKind::Select(SelectConfig {
//!         mode: SelectMode::Include,
//!         columns: vec!["customer".into(), "total".into()],
//!     }));
//!     graph.connect(input, filter, 0)?;
//!     graph.connect(filter, select, 0)?;
//!
//!     // 3. Compile and render.
//!     let expr = Compiler::new(&graph, &registry).compile(select)?;
//!     println!("{}", expr.compile_to_sql());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod compiler;
pub mod daterange;
pub mod error;
pub mod formula;
pub mod graph;
pub mod prelude;
pub mod rel;
pub mod scheduler;
pub mod schema;
