//! Inventory panel with inline quantity editing
//!
//! # State Progression
//! VIEWING → EDITING → SAVING → VIEWING (update ok) | EDITING (update failed)
//!
//! The board holds the edit focus as a single `Option<StockEditSession>`, so
//! at most one row is ever being edited or saved.

use crate::models::{decode_stock_rows, RowId, StockRow};
use crate::remote::StockSource;
use safeapp_common::{normalize, Error, Result};
use std::sync::Arc;

/// Edit state of the inventory view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing,
    Saving,
}

/// Quantity edit on one row
#[derive(Debug, Clone, PartialEq)]
pub struct StockEditSession {
    row_id: RowId,
    original: u32,
    buffer: u32,
    state: EditState,
}

impl StockEditSession {
    /// Snapshot the row's quantity into the edit buffer
    pub fn begin(row: &StockRow) -> Self {
        Self {
            row_id: row.row_id.clone(),
            original: row.quantity_remaining,
            buffer: row.quantity_remaining,
            state: EditState::Editing,
        }
    }

    pub fn row_id(&self) -> &RowId {
        &self.row_id
    }

    pub fn buffer(&self) -> u32 {
        self.buffer
    }

    /// Quantity the row showed when editing began
    pub fn original(&self) -> u32 {
        self.original
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    /// Move the buffer by `delta`, never below zero
    pub fn adjust(&mut self, delta: i64) -> u32 {
        let next = (i64::from(self.buffer) + delta).clamp(0, i64::from(u32::MAX));
        self.buffer = next as u32;
        self.buffer
    }

    /// Push the buffer to the source. On failure the session is back in
    /// Editing with the buffer untouched.
    pub async fn commit(&mut self, source: &dyn StockSource) -> Result<()> {
        if self.state == EditState::Saving {
            return Err(Error::InvalidState(format!(
                "row {} is already being saved",
                self.row_id
            )));
        }

        self.state = EditState::Saving;
        tracing::debug!(row_id = %self.row_id, quantity = self.buffer, "Saving stock quantity");

        match source.update_stock_row(&self.row_id, self.buffer).await {
            Ok(()) => {
                self.state = EditState::Viewing;
                Ok(())
            }
            Err(e) => {
                self.state = EditState::Editing;
                tracing::warn!(row_id = %self.row_id, error = %e, "Stock update failed");
                Err(e)
            }
        }
    }
}

/// Loaded inventory plus the single edit focus
pub struct StockBoard {
    source: Arc<dyn StockSource>,
    rows: Vec<StockRow>,
    edit: Option<StockEditSession>,
}

impl StockBoard {
    pub fn new(source: Arc<dyn StockSource>) -> Self {
        Self {
            source,
            rows: Vec::new(),
            edit: None,
        }
    }

    /// Reload every row from the source of truth
    pub async fn reload(&mut self) -> Result<()> {
        let raw = self.source.list_stock().await?;
        self.rows = decode_stock_rows(normalize(raw));
        tracing::info!(rows = self.rows.len(), "Stock loaded");
        Ok(())
    }

    pub fn rows(&self) -> &[StockRow] {
        &self.rows
    }

    pub fn low_stock(&self) -> Vec<&StockRow> {
        self.rows.iter().filter(|r| r.is_low_stock()).collect()
    }

    pub fn edit_state(&self) -> EditState {
        self.edit
            .as_ref()
            .map(StockEditSession::state)
            .unwrap_or(EditState::Viewing)
    }

    pub fn editing(&self) -> Option<&StockEditSession> {
        self.edit.as_ref()
    }

    /// Quantity shown for a row: the buffer while that row is edited
    pub fn displayed_quantity(&self, row_id: &RowId) -> Option<u32> {
        if let Some(edit) = self.edit.as_ref().filter(|e| &e.row_id == row_id) {
            return Some(edit.buffer);
        }
        self.find(row_id).map(|r| r.quantity_remaining)
    }

    fn find(&self, row_id: &RowId) -> Option<&StockRow> {
        self.rows.iter().find(|r| &r.row_id == row_id)
    }

    /// Start editing a row. Focus moves off any row still in Editing; a row
    /// being saved keeps the focus.
    pub fn begin(&mut self, row_id: &RowId) -> Result<()> {
        if self.edit_state() == EditState::Saving {
            return Err(Error::InvalidState("a stock update is in flight".to_string()));
        }
        let row = self
            .find(row_id)
            .ok_or_else(|| Error::NotFound(format!("stock row {}", row_id)))?;
        let session = StockEditSession::begin(row);

        if let Some(previous) = self.edit.replace(session) {
            tracing::debug!(row_id = %previous.row_id, "Discarding previous stock edit");
        }
        Ok(())
    }

    pub fn adjust(&mut self, delta: i64) -> Result<u32> {
        match self.edit.as_mut() {
            Some(edit) if edit.state == EditState::Editing => Ok(edit.adjust(delta)),
            Some(_) => Err(Error::InvalidState("stock update in flight".to_string())),
            None => Err(Error::InvalidState("no stock row is being edited".to_string())),
        }
    }

    /// Save the focused row, then reload everything. No local write: the
    /// displayed value only changes through the reload.
    pub async fn commit(&mut self) -> Result<()> {
        let edit = self
            .edit
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no stock row is being edited".to_string()))?;

        edit.commit(self.source.as_ref()).await?;

        let saved = self.edit.take();
        if let Some(saved) = saved {
            tracing::info!(row_id = %saved.row_id, quantity = saved.buffer, "Stock quantity updated");
        }
        self.reload().await
    }

    /// Drop the edit; the row shows its loaded quantity again
    pub fn cancel(&mut self) {
        if let Some(edit) = self.edit.take() {
            tracing::debug!(row_id = %edit.row_id, "Stock edit cancelled");
        }
    }
}
