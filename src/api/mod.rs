//! Thin client for the platform API. Transport and retries stay inside
//! reqwest; this module only shapes requests and maps failures.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub mod models;

use models::{
    ExternalIdRef, FileRef, FileUpload, FileUploadResponse, Function, FunctionSpec,
    FunctionStatus, Items, LoginStatus, LoginStatusResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{context} ({status}): {message}")]
    Api {
        context: &'static str,
        status: StatusCode,
        message: String,
    },
    #[error("{context}: response contained no items")]
    EmptyResponse { context: &'static str },
    #[error("file upload was not assigned an upload URL")]
    MissingUploadUrl,
}

/// Result of a best-effort delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing was registered under the identity.
    NotFound,
}

/// The platform calls the orchestrator depends on.
///
/// Implemented by [`CdfClient`] for production; tests substitute a scripted
/// stand-in.
#[async_trait]
pub trait FunctionsApi {
    async fn login_status(&self) -> Result<LoginStatus, ApiError>;

    /// Upload a source archive, overwriting any file already registered
    /// under `external_id`.
    async fn upload_source(
        &self,
        external_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileRef, ApiError>;

    async fn create_function(&self, spec: FunctionSpec) -> Result<Function, ApiError>;

    async fn delete_function(&self, external_id: &str) -> Result<DeleteOutcome, ApiError>;

    async fn function_status(&self, external_id: &str) -> Result<FunctionStatus, ApiError>;
}

pub struct CdfClient {
    http: Client,
    base_url: String,
    project: String,
    api_key: String,
}

impl CdfClient {
    pub fn new(http: Client, base_url: &str, project: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            project: project.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn functions_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/playground/projects/{}/functions{}",
            self.base_url, self.project, suffix
        )
    }

    async fn post_json<B, R>(
        &self,
        url: String,
        context: &'static str,
        body: &B,
    ) -> Result<R, ApiError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        let response = check(context, response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl FunctionsApi for CdfClient {
    async fn login_status(&self) -> Result<LoginStatus, ApiError> {
        let url = format!("{}/login/status", self.base_url);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;
        let response = check("login status", response).await?;
        let status: LoginStatusResponse = response.json().await?;
        Ok(status.data)
    }

    async fn upload_source(
        &self,
        external_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileRef, ApiError> {
        // Two steps: register the file (returns a presigned URL), then put
        // the archive bytes there.
        let url = format!(
            "{}/api/v1/projects/{}/files?overwrite=true",
            self.base_url, self.project
        );
        let metadata = FileUpload {
            name: file_name.to_string(),
            external_id: external_id.to_string(),
            mime_type: "application/zip".to_string(),
        };
        let registered: FileUploadResponse =
            self.post_json(url, "register file", &metadata).await?;
        let upload_url = registered.upload_url.ok_or(ApiError::MissingUploadUrl)?;

        debug!("PUT {}", upload_url);
        let response = self
            .http
            .put(&upload_url)
            .header("Content-Type", "application/zip")
            .body(bytes)
            .send()
            .await?;
        check("upload file contents", response).await?;

        Ok(FileRef(registered.id))
    }

    async fn create_function(&self, spec: FunctionSpec) -> Result<Function, ApiError> {
        let body = Items::one(spec);
        let created: Items<Function> = self
            .post_json(self.functions_url(""), "create function", &body)
            .await?;
        created.items.into_iter().next().ok_or(ApiError::EmptyResponse {
            context: "create function",
        })
    }

    async fn delete_function(&self, external_id: &str) -> Result<DeleteOutcome, ApiError> {
        let url = self.functions_url("/delete");
        let body = Items::one(ExternalIdRef {
            external_id: external_id.to_string(),
        });
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeleteOutcome::Deleted);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        // The platform reports a missing external id as a client error.
        if status == StatusCode::NOT_FOUND
            || (status == StatusCode::BAD_REQUEST && message.contains("not found"))
        {
            return Ok(DeleteOutcome::NotFound);
        }
        Err(ApiError::Api {
            context: "delete function",
            status,
            message,
        })
    }

    async fn function_status(&self, external_id: &str) -> Result<FunctionStatus, ApiError> {
        let body = Items::one(ExternalIdRef {
            external_id: external_id.to_string(),
        });
        let found: Items<Function> = self
            .post_json(self.functions_url("/byids"), "retrieve function", &body)
            .await?;
        let function = found.items.into_iter().next().ok_or(ApiError::EmptyResponse {
            context: "retrieve function",
        })?;
        Ok(function.status)
    }
}

async fn check(
    context: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ApiError::Api {
        context,
        status,
        message,
    })
}
