//! Generation session state.
//!
//! Holds what one user works with between runs: the base message, the
//! editable list of variations, and the rows produced by the last successful
//! generation. User-input problems are reported as [`InputError`]s and leave
//! the session untouched.

use std::path::Path;

use tracing::warn;

use crate::error::{InputError, SessionError};
use crate::export::{self, ExportFormat};
use crate::generation::{
    BatchRequest, BatchResult, Dispatcher, ExportRow, FailurePolicy, Variation,
};

/// Number of placeholder variations a new session starts with.
const INITIAL_VARIATIONS: usize = 2;

/// One user's working set.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    message: String,
    variations: Vec<Variation>,
    batch: Option<BatchResult>,
    rows: Vec<ExportRow>,
    failed: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// New session seeded with `V1` and `V2`.
    pub fn new() -> Self {
        Self::with_variations((1..=INITIAL_VARIATIONS).map(Variation::default_named).collect())
    }

    /// New session with the given variations.
    pub fn with_variations(variations: Vec<Variation>) -> Self {
        Self {
            message: String::new(),
            variations,
            batch: None,
            rows: Vec::new(),
            failed: 0,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    pub fn variation_mut(&mut self, index: usize) -> Option<&mut Variation> {
        self.variations.get_mut(index)
    }

    /// Append a placeholder named after the new list length.
    pub fn add_variation(&mut self) -> &mut Variation {
        let next = Variation::default_named(self.variations.len() + 1);
        self.variations.push(next);
        let last = self.variations.len() - 1;
        &mut self.variations[last]
    }

    /// Remove and return the variation at `index`, if any.
    pub fn remove_variation(&mut self, index: usize) -> Option<Variation> {
        if index < self.variations.len() {
            Some(self.variations.remove(index))
        } else {
            None
        }
    }

    /// Rows from the last successful generation.
    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    /// Normalized results from the last successful generation.
    pub fn batch(&self) -> Option<&BatchResult> {
        self.batch.as_ref()
    }

    /// Variations that failed in the last keep-going generation.
    pub fn failed_count(&self) -> usize {
        self.failed
    }

    /// Snapshot the current inputs as a batch request.
    ///
    /// The variation list is checked before the message. A message of only
    /// whitespace counts as empty.
    pub fn batch_request(&self) -> Result<BatchRequest, InputError> {
        if self.variations.is_empty() {
            return Err(InputError::NoVariations);
        }
        if self.message.trim().is_empty() {
            return Err(InputError::EmptyMessage);
        }
        Ok(BatchRequest::new(
            self.message.clone(),
            self.variations.clone(),
        ))
    }

    /// Generate every variation and replace the stored results.
    ///
    /// Messages are stored as the client returned them; they are not
    /// normalized a second time. On any error the previous results are kept.
    pub async fn generate(
        &mut self,
        dispatcher: &Dispatcher,
        policy: FailurePolicy,
    ) -> Result<&[ExportRow], SessionError> {
        let request = self.batch_request()?;
        let outcomes = dispatcher.run(&request, policy).await?;

        let batch = BatchResult::from_messages(outcomes.iter().map(|o| o.message_or_marker()));
        let rows = batch.to_rows(&request.variations);

        self.failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if self.failed > 0 {
            warn!(
                failed = self.failed,
                total = outcomes.len(),
                "Some variations failed; error markers stored in their rows"
            );
        }

        self.batch = Some(batch);
        self.rows = rows;
        Ok(&self.rows)
    }

    /// Export the stored rows.
    pub fn export(&self, format: ExportFormat, path: &Path) -> Result<(), SessionError> {
        if self.rows.is_empty() {
            return Err(InputError::NothingToExport.into());
        }
        export::export(format, &self.rows, path)?;
        Ok(())
    }
}
