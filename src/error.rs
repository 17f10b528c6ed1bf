use thiserror::Error;

/// Errors that can occur while compiling a single node into a relational
/// expression. These are recoverable: they are reported for the offending
/// node and cleared by the next successful compile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Table '{table}' is not available in the warehouse")]
    TableUnavailable { table: String },

    #[error("Node '{node_id}' was not found in the workflow graph")]
    NodeNotFound { node_id: u32 },

    #[error("{kind} needs more parents: requires {required}, but {connected} connected")]
    NeedsMoreParents {
        kind: &'static str,
        required: usize,
        connected: usize,
    },

    #[error("{kind} accepts at most {allowed} parents, but {connected} connected")]
    TooManyParents {
        kind: &'static str,
        allowed: usize,
        connected: usize,
    },

    #[error("Column '{column}' does not exist in the input schema")]
    UnknownColumn { column: String },

    #[error("Function '{function}' is not defined for {ty} values")]
    UnknownFunction { ty: String, function: String },

    #[error("Function '{function}' takes {expected} arguments, but {found} were given")]
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Input schemas do not match at column '{column}': {left} vs {right}")]
    SchemaMismatch {
        column: String,
        left: String,
        right: String,
    },

    #[error("Column '{column}' has type {found}, but {expected} was expected")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("'{name}' is not a valid column identifier")]
    InvalidIdentifier { name: String },

    #[error("Column '{name}' already exists")]
    DuplicateColumn { name: String },

    #[error("Selection would produce no columns")]
    EmptySelection,

    #[error("Formula error at position {position}: {message}")]
    FormulaSyntax { message: String, position: usize },

    #[error("Invalid configuration: {0}")]
    BadConfig(String),
}

/// A dependency cycle, detected before any mutation or execution takes place.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("dependency cycle detected: {0}")]
pub struct CycleError(pub String);

/// Errors raised while mutating the workflow graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Node '{node_id}' was not found in the workflow graph")]
    NodeNotFound { node_id: u32 },

    #[error("Node '{child}' already has a parent at position {position}")]
    PositionTaken { child: u32, position: u32 },
}

/// A failure raised by an entity's external `run()` collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("warehouse job failed: {0}")]
    Warehouse(String),

    #[error("entity run failed: {0}")]
    Entity(String),
}

/// Errors surfaced for an entire project execution pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("not all integrations and workflows completed successfully: {}", failed.join(", "))]
    EntitiesFailed { failed: Vec<String> },
}
