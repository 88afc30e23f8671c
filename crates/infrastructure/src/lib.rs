//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_notification_dispatcher;
mod file_draft_store;
mod http_notification_dispatcher;
mod http_object_storage;
mod in_memory_authorization_repository;
mod in_memory_draft_store;
mod in_memory_form_repository;
mod in_memory_object_storage;
mod in_memory_submission_repository;
mod notification_template;
mod postgres_authorization_repository;
mod postgres_form_repository;
mod postgres_submission_repository;
mod smtp_notification_dispatcher;

pub use console_notification_dispatcher::ConsoleNotificationDispatcher;
pub use file_draft_store::FileDraftStore;
pub use http_notification_dispatcher::HttpNotificationDispatcher;
pub use http_object_storage::{HttpObjectStorage, HttpObjectStorageConfig};
pub use in_memory_authorization_repository::InMemoryAuthorizationRepository;
pub use in_memory_draft_store::InMemoryDraftStore;
pub use in_memory_form_repository::InMemoryFormRepository;
pub use in_memory_object_storage::{InMemoryObject, InMemoryObjectStorage};
pub use in_memory_submission_repository::InMemorySubmissionRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_form_repository::PostgresFormRepository;
pub use postgres_submission_repository::PostgresSubmissionRepository;
pub use smtp_notification_dispatcher::{SmtpConfig, SmtpNotificationDispatcher};
