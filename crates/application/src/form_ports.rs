mod catalog;
mod draft_store;
mod object_storage;

pub use catalog::{FieldCatalogRepository, UploadConfigRepository};
pub use draft_store::DraftStore;
pub use object_storage::{ObjectStorage, StoredObject};
