//! Project-level DAG execution.
//!
//! A project's scheduling graph is derived, not stored: every INPUT node's
//! table reference is resolved back to the entity that produced the table
//! (an integration, or another workflow's OUTPUT node). Execution is
//! single-threaded and strictly sequential in topological order. A cycle
//! aborts the whole pass before any [`JobRun`] is created; a failed entity
//! does not — independent branches proceed, and downstream entities are
//! still attempted even when their only upstream dependency failed.

use crate::backend::{SchemaRegistry, Warehouse};
use crate::compiler::Compiler;
use crate::error::{CycleError, RunError, ScheduleError};
use crate::graph::{NodeKind, WorkflowGraph};
use crate::schema::{Table, TableRef, TableSource};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, error, info, warn};

/// A vertex of the project scheduling graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Integration(u32),
    Workflow(u32),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Integration(id) => write!(f, "integration {}", id),
            EntityId::Workflow(id) => write!(f, "workflow {}", id),
        }
    }
}

/// An external data import whose sync produces one or more tables.
#[derive(Debug)]
pub struct Integration {
    pub id: u32,
    pub name: String,
    pub schedulable: bool,
}

/// A named node DAG producing materialized outputs.
#[derive(Debug)]
pub struct Workflow {
    pub id: u32,
    pub name: String,
    pub graph: WorkflowGraph,
    pub schedulable: bool,
    pub last_run: Option<DateTime<Utc>>,
}

impl Workflow {
    /// A workflow is out of date until it has run at least once after the
    /// latest data-relevant change to any of its nodes.
    pub fn out_of_date(&self) -> bool {
        match (self.last_run, self.graph.max_data_updated()) {
            (None, _) => true,
            (Some(last_run), Some(updated)) => last_run < updated,
            (Some(_), None) => false,
        }
    }
}

/// A set of integrations and workflows scheduled together.
#[derive(Debug, Default)]
pub struct Project {
    pub name: String,
    pub integrations: Vec<Integration>,
    pub workflows: Vec<Workflow>,
    pub tables: Vec<Table>,
}

impl Project {
    /// The entity that produced `table`, if the table is known.
    pub fn producer_of(&self, table: &TableRef) -> Option<EntityId> {
        self.tables
            .iter()
            .find(|t| &t.table_ref == table)
            .map(|t| match &t.source {
                TableSource::Integration(id) => EntityId::Integration(*id),
                TableSource::WorkflowOutput { workflow, .. } => EntityId::Workflow(*workflow),
            })
    }

    /// Distinct upstream entities referenced by the workflow's INPUT nodes.
    pub fn dependencies(&self, workflow: &Workflow) -> Vec<EntityId> {
        let own = EntityId::Workflow(workflow.id);
        let mut deps = Vec::new();
        for node in workflow.graph.nodes() {
            if let NodeKind::Input(cfg) = &node.kind {
                if let Some(producer) = self.producer_of(&cfg.table) {
                    if producer != own && !deps.contains(&producer) {
                        deps.push(producer);
                    }
                }
            }
        }
        deps
    }

    pub fn workflow(&self, id: u32) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.id == id)
    }

    pub fn integration(&self, id: u32) -> Option<&Integration> {
        self.integrations.iter().find(|i| i.id == id)
    }

    fn entity_name(&self, entity: EntityId) -> String {
        match entity {
            EntityId::Integration(id) => self
                .integration(id)
                .map(|i| i.name.clone())
                .unwrap_or_else(|| entity.to_string()),
            EntityId::Workflow(id) => self
                .workflow(id)
                .map(|w| w.name.clone())
                .unwrap_or_else(|| entity.to_string()),
        }
    }
}

/// Lifecycle of one entity's execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Success,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Success => "success",
            JobState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// One execution attempt of a single integration or workflow.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub entity: EntityId,
    pub name: String,
    pub state: JobState,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphRunStatus {
    Success,
    Failed,
}

/// One execution attempt of an entire project pass. Succeeds iff every
/// owned [`JobRun`] succeeds; per-job states stay queryable either way.
#[derive(Debug)]
pub struct GraphRun {
    pub project: String,
    pub status: GraphRunStatus,
    pub jobs: Vec<JobRun>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl GraphRun {
    pub fn succeeded(&self) -> bool {
        self.status == GraphRunStatus::Success
    }

    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobRun> {
        self.jobs.iter().filter(|j| j.state == JobState::Failed)
    }

    /// Collapses a failed pass into one aggregate error naming the failed
    /// entities.
    pub fn into_result(self) -> Result<GraphRun, ScheduleError> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(ScheduleError::EntitiesFailed {
                failed: self.failed_jobs().map(|j| j.name.clone()).collect(),
            })
        }
    }
}

/// The opaque external collaborator that actually syncs an integration or
/// materializes a workflow. May block for an unbounded duration.
pub trait EntityRun {
    fn run(&mut self, entity: EntityId) -> Result<(), RunError>;
}

/// Builds the dependency graph and returns a topological execution order.
///
/// With `scheduled_only`, the vertex set is restricted to schedulable
/// entities, and each remaining entity's upstream edges to schedulable
/// neighbors.
pub fn execution_order(
    project: &Project,
    scheduled_only: bool,
) -> Result<Vec<EntityId>, CycleError> {
    let mut vertices: Vec<EntityId> = Vec::new();
    for integration in &project.integrations {
        if !scheduled_only || integration.schedulable {
            vertices.push(EntityId::Integration(integration.id));
        }
    }
    for workflow in &project.workflows {
        if !scheduled_only || workflow.schedulable {
            vertices.push(EntityId::Workflow(workflow.id));
        }
    }

    let mut adjacency: AHashMap<EntityId, Vec<EntityId>> = AHashMap::new();
    let mut in_degree: AHashMap<EntityId, usize> =
        vertices.iter().map(|v| (*v, 0)).collect();

    for workflow in &project.workflows {
        let vertex = EntityId::Workflow(workflow.id);
        if !in_degree.contains_key(&vertex) {
            continue;
        }
        for dep in project.dependencies(workflow) {
            if !in_degree.contains_key(&dep) {
                continue;
            }
            adjacency.entry(dep).or_default().push(vertex);
            *in_degree.entry(vertex).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<EntityId> = vertices
        .iter()
        .filter(|v| in_degree[*v] == 0)
        .copied()
        .collect();

    let mut sorted = Vec::with_capacity(vertices.len());
    while let Some(vertex) = queue.pop_front() {
        sorted.push(vertex);
        if let Some(downstream) = adjacency.get(&vertex) {
            for &next in downstream {
                let deg = in_degree.entry(next).or_insert(0);
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if sorted.len() != vertices.len() {
        return Err(CycleError(
            "project dependency graph is not acyclic".into(),
        ));
    }
    Ok(sorted)
}

/// Executes one full project pass in topological order.
///
/// A cycle aborts before any `JobRun` exists. Entity failures are caught,
/// recorded on the owning `JobRun`, and do not stop the pass; the returned
/// [`GraphRun`] reports `Failed` if any job failed.
pub fn run_project(
    project: &Project,
    runner: &mut dyn EntityRun,
    scheduled_only: bool,
) -> Result<GraphRun, CycleError> {
    let order = execution_order(project, scheduled_only)?;
    let started_at = Utc::now();
    info!(
        project = %project.name,
        entities = order.len(),
        "starting graph run"
    );

    let mut jobs = Vec::with_capacity(order.len());
    for entity in order {
        let name = project.entity_name(entity);
        let mut job = JobRun {
            entity,
            name: name.clone(),
            state: JobState::Pending,
            error: None,
            started_at: None,
            completed_at: None,
        };

        job.state = JobState::Running;
        job.started_at = Some(Utc::now());
        info!(entity = %entity, name = %name, "running entity");

        match runner.run(entity) {
            Ok(()) => {
                job.state = JobState::Success;
                info!(entity = %entity, name = %name, "entity succeeded");
            }
            Err(err) => {
                job.state = JobState::Failed;
                job.error = Some(err.to_string());
                error!(entity = %entity, name = %name, error = %err, "entity failed");
            }
        }
        job.completed_at = Some(Utc::now());
        jobs.push(job);
    }

    let failed = jobs.iter().filter(|j| j.state == JobState::Failed).count();
    let status = if failed == 0 {
        GraphRunStatus::Success
    } else {
        warn!(
            project = %project.name,
            failed,
            "graph run finished with failures"
        );
        GraphRunStatus::Failed
    };

    Ok(GraphRun {
        project: project.name.clone(),
        status,
        jobs,
        started_at,
        completed_at: Utc::now(),
    })
}

/// The in-crate [`EntityRun`] implementation for workflow materialization:
/// compiles every OUTPUT node and writes it through the [`Warehouse`].
/// Integration syncs are owned by external connector collaborators and are
/// a no-op here.
pub struct WarehouseRunner<'a> {
    pub project: &'a Project,
    pub registry: &'a dyn SchemaRegistry,
    pub warehouse: &'a mut dyn Warehouse,
}

impl<'a> EntityRun for WarehouseRunner<'a> {
    fn run(&mut self, entity: EntityId) -> Result<(), RunError> {
        let id = match entity {
            EntityId::Integration(_) => {
                debug!(entity = %entity, "integration sync handled externally");
                return Ok(());
            }
            EntityId::Workflow(id) => id,
        };
        let workflow = self
            .project
            .workflow(id)
            .ok_or_else(|| RunError::Entity(format!("unknown workflow {}", id)))?;

        let compiler = Compiler::new(&workflow.graph, self.registry);
        for output in workflow.graph.output_nodes() {
            let expr = compiler
                .compile(output)
                .map_err(|err| RunError::Entity(err.to_string()))?;
            let name = match workflow.graph.node(output).map(|n| &n.kind) {
                Some(NodeKind::Output(cfg)) => cfg
                    .table_name
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", workflow.name, output)),
                _ => format!("{}_{}", workflow.name, output),
            };
            let target = TableRef::new(self.project.name.clone(), name);
            self.warehouse.materialize(&expr, &target)?;
        }
        Ok(())
    }
}
