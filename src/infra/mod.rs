//! Managed-service collaborators: secret retrieval and object storage.

pub mod keys;
pub mod storage;
