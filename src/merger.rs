use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ConfigurationError, Result};
use crate::network::{Dataset, MergeConfig, NetworkMerge, Table};
use crate::output::{OutputModel, YearSlice};

/// Progress of the tables held by a [`Merger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergerState {
    /// At least one table is still empty.
    Missing,
    /// Every table is present and the current model, if any, is stale.
    Ready,
    /// The current model was built from the tables as they are.
    Complete,
}

/// Holds the raw tables and the model last built from them.
///
/// A failed merge leaves the previous model in place. Readers hold an
/// [`Arc`] to the model they got, so a later merge never changes it.
#[derive(Debug, Default)]
pub struct Merger {
    dataset: Dataset,
    config: MergeConfig,
    model: Option<Arc<OutputModel>>,
    fresh: bool,
}

impl Merger {
    /// Creates an empty merger using `config`.
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replaces the table of the same kind.
    pub fn add_table(&mut self, table: Table) {
        debug!(table = table.kind().name(), "table added");
        self.dataset.set(table);
        self.fresh = false;
    }

    /// Returns the tables added so far.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Returns the merge configuration.
    #[must_use]
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Returns the current state of the tables and model.
    #[must_use]
    pub fn state(&self) -> MergerState {
        if !self.dataset.missing().is_empty() {
            MergerState::Missing
        } else if self.fresh {
            MergerState::Complete
        } else {
            MergerState::Ready
        }
    }

    /// Builds a new model from the current tables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::IncompleteDataset`] when a table is
    /// missing, or any error of [`NetworkMerge::execute`]. The previous
    /// model stays current in both cases.
    pub fn merge(&mut self) -> Result<Arc<OutputModel>> {
        let missing = self.dataset.missing();
        if !missing.is_empty() {
            return Err(ConfigurationError::IncompleteDataset {
                missing: missing.into_iter().map(|kind| kind.name()).collect(),
            }
            .into());
        }
        let model = Arc::new(NetworkMerge::new(&self.dataset, self.config.clone()).execute()?);
        self.model = Some(Arc::clone(&model));
        self.fresh = true;
        info!(span = ?model.span, "model replaced");
        Ok(model)
    }

    /// The model of the last successful merge.
    #[must_use]
    pub fn model(&self) -> Option<Arc<OutputModel>> {
        self.model.clone()
    }

    /// Selects the year served by [`Merger::current_slice`].
    pub fn select_year(&mut self, year: i32) {
        self.config.selected_year = Some(year);
    }

    /// The selected year, or the first year of the model.
    #[must_use]
    pub fn selected_year(&self) -> Option<i32> {
        self.config.selected_year.or_else(|| {
            self.model
                .as_ref()
                .and_then(|model| model.span)
                .map(|span| span.begin())
        })
    }

    /// The selected year of the current model.
    #[must_use]
    pub fn current_slice(&self) -> Option<YearSlice<'_>> {
        let year = self.selected_year()?;
        Some(self.model.as_deref()?.slice(year))
    }
}
