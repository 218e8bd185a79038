//! The grid pipeline.
//!
//! A [`DataGridBuilder`] collects column, layout and state-source
//! declarations for one request. [`DataGridBuilder::build`] validates them and
//! loads the persisted configuration; [`DataGrid::get`] then runs the
//! per-request pipeline:
//!
//! 1. normalize state from the request, session or configuration
//! 2. apply the current layout
//! 3. compile selects, sort, search and filters onto the base query
//! 4. count, page and fetch
//! 5. decorate rows and assemble metadata

pub(crate) mod compiler;
mod layout;
mod metadata;
mod normalizer;
mod postprocess;

use std::sync::Arc;
use std::time::Instant;

use gridshape_core::column::{basic_alias, DEFAULT_TIMESTAMP_FORMAT};
use gridshape_core::icon::DEFAULT_ICON_COLOR;
use gridshape_core::types::value_as_text;
use gridshape_core::{
    render, validate_layouts, BuildError, ColumnDefinition, ColumnRegistry, ColumnType,
    ConfigField, ConfigRecord, GridContext, GridRequest, GridResponse, IconRule,
    LayoutDefinition, QueryPlan, Row, SortBy, SortDirection, StateSource, StateSources, Value,
};
use tracing::{info_span, Instrument};

use self::compiler::{apply_paging, QueryCompiler};
use self::layout::{apply_layout, clear_current, find_layout, identify_predefined};
use self::metadata::{assemble, MetaInputs};
use self::normalizer::{adopt_sort, normalize, StateInputs};
use self::postprocess::PostProcessor;
use crate::error::GridError;
use crate::service::{load_configuration, GridServices};

/// Transform applied to every decorated row, last.
pub type RowMapper = Arc<dyn Fn(Row) -> Row + Send + Sync>;

/// Icon declaration for [`DataGridBuilder::add_icon_column`].
#[derive(Debug, Clone)]
pub enum IconSpec {
    /// The same icon on every row.
    Static { icon: String, color: Option<String> },
    /// Conditional rules evaluated per row.
    Rules(Vec<IconRule>),
}

impl IconSpec {
    fn into_rules(self) -> Vec<IconRule> {
        match self {
            Self::Static { icon, color } => vec![IconRule::fallback(icon)
                .color(color.unwrap_or_else(|| DEFAULT_ICON_COLOR.to_string()))],
            Self::Rules(rules) => rules,
        }
    }
}

// ---------------------------------------------------------------------------
// DataGridBuilder
// ---------------------------------------------------------------------------

/// Declares a grid over a base query.
pub struct DataGridBuilder {
    context: GridContext,
    request: GridRequest,
    base: QueryPlan,
    registry: ColumnRegistry,
    deferred: Option<BuildError>,
    views: Option<Vec<LayoutDefinition>>,
    sources: StateSources,
    hyperlinks: bool,
    selects: Vec<String>,
    raw_selects: Vec<String>,
    mapper: Option<RowMapper>,
    relationships: Vec<String>,
    default_order: SortBy,
}

impl DataGridBuilder {
    fn push(mut self, column: ColumnDefinition) -> Self {
        if self.deferred.is_none() {
            if let Err(err) = self.registry.push(column) {
                self.deferred = Some(err);
            }
        }
        self
    }

    /// Adds a column whose output alias is the last `.` segment of `raw`.
    #[must_use]
    pub fn add_column(self, raw: &str, label: &str, r#type: ColumnType) -> Self {
        let column = ColumnDefinition::simple(basic_alias(raw), raw, label, r#type);
        self.push(column)
    }

    /// Adds a fully specified column.
    #[must_use]
    pub fn add_advanced_column(self, column: ColumnDefinition) -> Self {
        self.push(column)
    }

    #[must_use]
    pub fn add_icon_column(self, raw: &str, label: &str, icon: IconSpec) -> Self {
        let column = ColumnDefinition::builder(basic_alias(raw), raw)
            .label(label)
            .kind(ColumnType::Icon)
            .raw(false)
            .icon_rules(icon.into_rules())
            .build();
        self.push(column)
    }

    /// Adds a column that is not selected from the data source. The row
    /// mapper is expected to fill it in.
    #[must_use]
    pub fn add_custom_column(self, id: &str, label: &str) -> Self {
        let column = ColumnDefinition::builder(id, id)
            .label(label)
            .kind(ColumnType::Custom)
            .searchable(false)
            .sortable(false)
            .build();
        self.push(column)
    }

    /// Declares the predefined layouts. At least one is required and at most
    /// one may be flagged default.
    #[must_use]
    pub fn views(mut self, layouts: impl IntoIterator<Item = LayoutDefinition>) -> Self {
        self.views = Some(layouts.into_iter().collect());
        self
    }

    #[must_use]
    pub fn filters_with_session(mut self) -> Self {
        self.sources.filter = StateSource::Session;
        self
    }

    /// Reads filters from the persisted configuration record.
    #[must_use]
    pub fn filters_with_config(mut self) -> Self {
        self.sources.filter = StateSource::Config;
        self
    }

    #[must_use]
    pub fn search_with_session(mut self) -> Self {
        self.sources.search = StateSource::Session;
        self
    }

    #[must_use]
    pub fn sort_with_session(mut self) -> Self {
        self.sources.sort = StateSource::Session;
        self
    }

    #[must_use]
    pub fn page_with_session(mut self) -> Self {
        self.sources.page = StateSource::Session;
        self
    }

    #[must_use]
    pub fn hyperlinks(mut self) -> Self {
        self.hyperlinks = true;
        self
    }

    /// Selects an extra plain column alongside the declared ones.
    #[must_use]
    pub fn add_select(mut self, column: impl Into<String>) -> Self {
        self.selects.push(column.into());
        self
    }

    /// Selects an extra raw SQL expression alongside the declared columns.
    #[must_use]
    pub fn add_raw_select(mut self, expression: impl Into<String>) -> Self {
        self.raw_selects.push(expression.into());
        self
    }

    #[must_use]
    pub fn map<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Row) -> Row + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Relationships the data source should eager-load onto fetched rows.
    #[must_use]
    pub fn load<I, S>(mut self, relationships: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships
            .extend(relationships.into_iter().map(Into::into));
        self
    }

    /// Sort applied when the client sends none. Takes precedence over the
    /// base query's own ordering.
    #[must_use]
    pub fn default_order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.default_order.insert(column.into(), direction);
        self
    }

    /// Validates the declaration and loads the grid's configuration,
    /// creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Build`] for an invalid column or layout
    /// declaration and [`GridError::Execution`] when the configuration store
    /// or the enumerator lookup fails.
    pub async fn build(self, services: &GridServices) -> Result<DataGrid, GridError> {
        if let Some(err) = self.deferred {
            return Err(err.into());
        }
        let mut registry = self.registry;

        let layouts = match self.views {
            Some(views) => {
                validate_layouts(&views, &registry)?;
                Some(views)
            }
            None => None,
        };

        let key = self.context.config_key();
        let record = load_configuration(services.configuration.as_ref(), &key).await?;

        for column in registry
            .iter_mut()
            .filter(|c| c.r#type == ColumnType::Timestamp)
        {
            if column.timestamp_format == DEFAULT_TIMESTAMP_FORMAT {
                column
                    .timestamp_format
                    .clone_from(&services.config.timestamp_format);
            }
        }

        for column in registry.iter_mut().filter(|c| c.needs_enumerators()) {
            let rows = services
                .data
                .fetch(&self.base.distinct_values(&column.raw_value))
                .await?;
            column.enumerators = generated_enumerators(&rows);
            tracing::debug!(
                column = %column.value,
                count = column.enumerators.len(),
                "generated enumerators"
            );
        }

        let layouts = layouts
            .map(|views| identify_predefined(views, record.current_layout.as_deref()))
            .unwrap_or_default();

        let mut selects = self.selects;
        selects.extend(self.raw_selects);

        Ok(DataGrid {
            context: self.context,
            request: self.request,
            base: self.base,
            registry,
            layouts,
            record,
            sources: self.sources,
            hyperlinks: self.hyperlinks,
            selects,
            mapper: self.mapper,
            relationships: self.relationships,
            default_order: self.default_order,
            services: services.clone(),
        })
    }
}

/// Label map built from the distinct values of a column: `in_progress`
/// becomes `In Progress`. Nulls are skipped.
fn generated_enumerators(rows: &[Row]) -> std::collections::BTreeMap<String, String> {
    rows.iter()
        .filter_map(|row| row.get("value").and_then(value_as_text))
        .map(|raw| {
            let label = raw
                .split('_')
                .filter(|word| !word.is_empty())
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" ");
            (raw.into_owned(), label)
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// DataGrid
// ---------------------------------------------------------------------------

/// A validated grid, ready to serve one request.
pub struct DataGrid {
    context: GridContext,
    request: GridRequest,
    base: QueryPlan,
    registry: ColumnRegistry,
    layouts: Vec<LayoutDefinition>,
    record: ConfigRecord,
    sources: StateSources,
    hyperlinks: bool,
    selects: Vec<String>,
    mapper: Option<RowMapper>,
    relationships: Vec<String>,
    default_order: SortBy,
    services: GridServices,
}

impl DataGrid {
    /// Starts declaring a grid over `base` for the request described by
    /// `context` and `request`.
    #[must_use]
    pub fn for_query(context: GridContext, request: GridRequest, base: QueryPlan) -> DataGridBuilder {
        DataGridBuilder {
            context,
            request,
            base,
            registry: ColumnRegistry::new(),
            deferred: None,
            views: None,
            sources: StateSources::default(),
            hyperlinks: false,
            selects: Vec::new(),
            raw_selects: Vec::new(),
            mapper: None,
            relationships: Vec::new(),
            default_order: SortBy::new(),
        }
    }

    /// Column labels in display order.
    #[must_use]
    pub fn column_labels(&self) -> Vec<String> {
        self.registry.labels()
    }

    /// Runs the grid pipeline and returns one page of decorated rows.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Icon`] when a row matches no icon rule and
    /// [`GridError::Execution`] for data source or store failures.
    pub async fn get(self) -> Result<GridResponse, GridError> {
        let table_ref = self.context.table_ref.clone();
        let span = info_span!(
            "grid_request",
            table_ref = %table_ref,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = self.run().await;
            let outcome = match &result {
                Ok(_) => "ok",
                Err(err) if err.is_configuration() => "invalid",
                Err(_) => "error",
            };

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::Span::current().record("duration_ms", duration_ms);
            tracing::Span::current().record("outcome", outcome);

            tracing::info!(
                table_ref = %table_ref,
                duration_ms = duration_ms,
                outcome = outcome,
                "grid request complete"
            );

            result
        }
        .instrument(span)
        .await
    }

    async fn run(mut self) -> Result<GridResponse, GridError> {
        let services = self.services.clone();
        let key = self.context.config_key();

        let sources = self.sources;
        let session = if [sources.filter, sources.search, sources.sort, sources.page]
            .contains(&StateSource::Session)
        {
            services.sessions.get(&key).await?
        } else {
            None
        };

        let mut plan = self.base;
        let base_orders = plan.take_orders();
        let mut state = normalize(&StateInputs {
            request: &self.request,
            session: session.as_ref(),
            record: &self.record,
            sources,
            default_items_per_page: services.config.default_items_per_page,
        });
        adopt_sort(&mut state, &self.request, base_orders, &self.default_order);

        if self.request.wants_layout_reset() {
            tracing::debug!(table_ref = %key.table_ref, "resetting current layout");
            services
                .configuration
                .update_configuration_value(&key, ConfigField::CurrentLayout, Value::Null)
                .await?;
            clear_current(&mut self.layouts);
            self.record.current_layout = None;
            state.current_layout = None;
        }

        if let Some(id) = &self.record.current_layout {
            match find_layout(id, &self.layouts, &self.record.layouts) {
                Some(layout) => apply_layout(layout, &mut state, &mut self.registry),
                None => tracing::debug!(layout = %id, "current layout not found"),
            }
        }

        plan.isolate_conditions();
        let compiler = QueryCompiler::new(&self.registry, &services.config.attachment_table);
        compiler.apply_selects(&mut plan, &self.selects);
        compiler.apply_sort(&mut plan, &state.sort_by);
        compiler.apply_search(&mut plan, &mut state.search);
        compiler.apply_filters(&mut plan, &state.filters);

        let total_items = services.data.count(&plan).await?;
        apply_paging(&mut plan, &state);
        tracing::debug!(
            sql = %render(&plan, services.config.dialect).sql,
            total_items,
            "compiled grid query"
        );

        let mut rows = services.data.fetch(&plan).await?;
        if !self.relationships.is_empty() {
            services
                .data
                .load_relationships(&mut rows, &self.relationships)
                .await?;
        }

        let items = PostProcessor {
            registry: &self.registry,
            attachments: services.attachments.as_ref(),
            object_storage_disk: &services.config.object_storage_disk,
            url_validity: services.config.avatar_url_validity,
            mapper: self.mapper.as_ref(),
        }
        .process(rows)
        .await?;

        let current = self.record.current_layout.clone();
        let mut layouts = self.layouts;
        layouts.extend(self.record.layouts.iter().cloned().map(|mut layout| {
            layout.current = current.as_deref() == Some(layout.id.as_str());
            layout
        }));

        let meta_data = assemble(MetaInputs {
            table_ref: &self.context.table_ref,
            state: &state,
            registry: &self.registry,
            layouts,
            current_layout: current,
            total_items,
            hyperlinks: self.hyperlinks,
            states: sources,
        });

        Ok(GridResponse { items, meta_data })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
