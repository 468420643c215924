//! inspector-core: Multi-host execution engine
//!
//! Column model, command selection, per-host execution and the concurrent
//! fan-out with its collector actor.

pub mod actor;
pub mod column;
pub mod config;
pub mod error;
pub mod executor;
pub mod message;
pub mod orchestrator;
pub mod selection;

pub use actor::aggregator::{AggregatorActor, AggregatorActorArgs};
pub use column::{ColumnResult, ColumnSpec, OUTPUT_COLUMN, Row, visible_names, visible_values};
pub use config::{InspectorConfig, RunConfig};
pub use error::CoreError;
pub use executor::{HostExecutor, column_value};
pub use message::{RecordRow, ResultAggregate, TakeAggregate};
pub use orchestrator::{HostFailure, InspectionReport, Orchestrator, OrchestratorOptions};
pub use selection::{RUN_KEYWORD, select_columns};
