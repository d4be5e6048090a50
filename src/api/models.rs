//! Wire types for the platform's files and functions endpoints.
//!
//! Every functions call wraps its payload in an `{"items": [...]}` envelope;
//! the types here keep that noise out of the client code.

use serde::{Deserialize, Serialize};

/// Request/response envelope used by the functions endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> Items<T> {
    pub fn one(item: T) -> Self {
        Self { items: vec![item] }
    }
}

/// Reference to a registration by its external id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdRef {
    pub external_id: String,
}

/// Payload for registering a new function.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub name: String,
    pub external_id: String,
    pub file_id: i64,
}

/// Deployment status reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FunctionStatus {
    #[default]
    Queued,
    Deploying,
    Ready,
    Failed,
}

impl std::fmt::Display for FunctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionStatus::Queued => write!(f, "Queued"),
            FunctionStatus::Deploying => write!(f, "Deploying"),
            FunctionStatus::Ready => write!(f, "Ready"),
            FunctionStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// A registered function as returned by the create and byids endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub id: i64,
    pub name: String,
    pub external_id: String,
    #[serde(default)]
    pub status: FunctionStatus,
}

/// Metadata sent when registering an upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub name: String,
    pub external_id: String,
    pub mime_type: String,
}

/// Upload registration response: the file id plus the URL the bytes go to.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub id: i64,
    pub upload_url: Option<String>,
}

/// Opaque handle to an uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRef(pub i64);

/// Credential check returned by `/login/status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatus {
    pub user: String,
    pub logged_in: bool,
    pub project: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginStatusResponse {
    pub data: LoginStatus,
}
