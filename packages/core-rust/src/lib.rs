//! `Gridshape` Core: column model, alias resolution, layouts, the query plan
//! and its SQL renderer, and the grid wire messages.

pub mod column;
pub mod compare;
pub mod context;
pub mod error;
pub mod icon;
pub mod layout;
pub mod messages;
pub mod plan;
pub mod registry;
pub mod sql;
pub mod state;
pub mod types;

pub use column::{ColumnBuilder, ColumnDefinition, ColumnType, ADVANCED_COLUMN_TYPES};
pub use compare::CompareOp;
pub use context::{ConfigKey, GridContext};
pub use error::{BuildError, IconError};
pub use icon::{select_icon, IconDisplay, IconRule};
pub use layout::{validate_layouts, LayoutBuilder, LayoutColumn, LayoutDefinition};
pub use messages::{
    ConfigField, ConfigRecord, GridRequest, GridResponse, MetaData, RequestError, SessionState,
    StateSource, StateSources,
};
pub use plan::{Predicate, QueryPlan, SqlOperator};
pub use registry::{Aspect, ColumnRegistry, Resolution};
pub use sql::{render, render_count, Dialect, RenderedSql};
pub use state::{FilterSpec, Filters, GridState, SearchState, SortBy};
pub use types::{Principal, Row, SortDirection, Value};
