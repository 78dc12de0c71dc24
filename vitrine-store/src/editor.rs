//! Editable-field contract.
//!
//! Each editable value on a rendered page is a tiny state machine: a
//! committed value that is always displayed, and, while an admin is
//! editing, a pending value that only becomes visible after an explicit
//! commit. Commits go through a [`FieldWriter`]; a failed write reverts
//! the pending value to the committed one and surfaces the error inline
//! instead of propagating it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::hub::ContentHub;
use crate::store::StoreError;

/// Persists one field update addressed by dotted path. Implemented over
/// the content hub's update functions; tests substitute recorders.
#[async_trait]
pub trait FieldWriter: Send + Sync {
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;
}

/// Which collection a field's writes land in.
#[derive(Debug, Clone)]
pub enum WriteTarget {
    Website,
    WebsiteImages,
    Footer,
    CompanyText(String),
    CompanyImage(String),
}

/// [`FieldWriter`] over the content hub.
pub struct HubWriter {
    hub: Arc<ContentHub>,
    target: WriteTarget,
}

impl HubWriter {
    pub fn new(hub: Arc<ContentHub>, target: WriteTarget) -> Self {
        Self { hub, target }
    }
}

#[async_trait]
impl FieldWriter for HubWriter {
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        match &self.target {
            WriteTarget::Website => self.hub.update_website_text(path, value).await,
            WriteTarget::WebsiteImages => self.hub.update_website_image(path, value).await,
            WriteTarget::Footer => self.hub.update_footer_text(path, value).await,
            WriteTarget::CompanyText(slug) => {
                self.hub.update_company_text(slug, path, value).await
            }
            WriteTarget::CompanyImage(slug) => {
                self.hub.update_company_image(slug, path, value).await
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing,
}

/// One editable value bound to a dotted path.
///
/// Fields created for a non-admin viewer never leave `Viewing`: the edit
/// affordance is unreachable and no write can be attempted.
#[derive(Debug, Clone)]
pub struct EditableField {
    path: String,
    committed: Value,
    pending: Value,
    state: EditState,
    is_admin: bool,
    last_error: Option<String>,
}

impl EditableField {
    pub fn new(path: impl Into<String>, initial: Value, is_admin: bool) -> Self {
        Self {
            path: path.into(),
            pending: initial.clone(),
            committed: initial,
            state: EditState::Viewing,
            is_admin,
            last_error: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The value the page shows: always the committed one.
    pub fn display_value(&self) -> &Value {
        &self.committed
    }

    pub fn pending_value(&self) -> &Value {
        &self.pending
    }

    pub fn is_editing(&self) -> bool {
        self.state == EditState::Editing
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Enter edit mode. Returns whether edit mode was entered; always
    /// false for non-admin viewers.
    pub fn begin_edit(&mut self) -> bool {
        if !self.is_admin {
            return false;
        }
        self.pending = self.committed.clone();
        self.state = EditState::Editing;
        true
    }

    pub fn set_pending(&mut self, value: Value) {
        if self.is_editing() {
            self.pending = value;
        }
    }

    /// Discard the pending value and leave edit mode. No write happens.
    pub fn cancel(&mut self) {
        self.pending = self.committed.clone();
        self.state = EditState::Viewing;
        self.last_error = None;
    }

    /// Persist the pending value. On success it becomes the committed
    /// value and edit mode closes. On failure the pending value reverts
    /// to the committed one, edit mode stays open, and the error is kept
    /// for inline display.
    ///
    /// A pending value that is an empty or whitespace-only string is
    /// refused locally: no write, edit mode stays open.
    pub async fn commit<W: FieldWriter + ?Sized>(&mut self, writer: &W) -> Result<(), StoreError> {
        if !self.is_editing() {
            return Ok(());
        }
        if let Some(text) = self.pending.as_str() {
            if text.trim().is_empty() {
                return Ok(());
            }
        }

        match writer.write(&self.path, self.pending.clone()).await {
            Ok(()) => {
                self.committed = self.pending.clone();
                self.state = EditState::Viewing;
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.pending = self.committed.clone();
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
