//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod draft;
mod field;
mod security;
mod submission;
mod upload;

pub use draft::{Draft, DraftFile};
pub use field::{
    FieldDefinition, FieldDefinitionInput, FieldSection, FieldType, InputKind, ValidationRules,
    sort_fields, validate_field_key,
};
pub use security::Permission;
pub use submission::{
    ApplicantContact, NewSubmission, StatusTransition, Submission, SubmissionId,
    SubmissionSnapshot, SubmissionStatus,
};
pub use upload::{
    CandidateFile, UploadConfig, UploadState, UploadStatus, file_extension, format_file_size,
    stored_at_from_path,
};
