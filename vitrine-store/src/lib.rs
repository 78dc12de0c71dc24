//! # vitrine-store
//!
//! Access layer between the site and its remote document store: the
//! store abstraction with a file-backed implementation, the in-memory
//! content snapshot that refetches on change notifications, the
//! editable-field state machine, and image preprocessing for uploads.

pub mod editor;
pub mod hub;
pub mod image_prep;
pub mod store;

pub use editor::{EditState, EditableField, FieldWriter, HubWriter, WriteTarget};
pub use hub::{ContentHub, ContentSnapshot};
pub use image_prep::{prepare_image, ImagePrepError};
pub use store::{collections, DocumentStore, FsStore, StoreError, StoreEvent};
