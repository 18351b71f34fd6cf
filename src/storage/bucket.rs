use std::fmt;
use std::path::{Path, PathBuf};

use object_store::aws::{AwsAuthorizer, AwsCredentialProvider};
use object_store::azure::{AzureAuthorizer, AzureCredentialProvider};
use object_store::gcp::GcpCredentialProvider;
use object_store::CredentialProvider;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Method, Request, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;

pub const GCS_API: &str = "https://storage.googleapis.com";

/// S3 rejects an explicit `LocationConstraint` for its default region.
const AWS_DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Existing,
    Created,
}

/// Makes sure the upload bucket exists, creating it when it does not.
///
/// `object_store` only works inside a bucket, so these calls go straight to
/// each provider's REST API, signed with the credentials of the store.
#[derive(Clone)]
pub struct BucketAdmin {
    client: Client,
    kind: AdminKind,
}

#[derive(Clone)]
enum AdminKind {
    Azure {
        credentials: AzureCredentialProvider,
        account: String,
        endpoint: String,
    },
    Aws {
        credentials: AwsCredentialProvider,
        region: String,
        endpoint: String,
    },
    Gcp {
        credentials: GcpCredentialProvider,
        service_account_path: PathBuf,
        location: String,
    },
}

// Credentials stay out of the output.
impl fmt::Debug for BucketAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AdminKind::Azure {
                account, endpoint, ..
            } => f
                .debug_struct("Azure")
                .field("account", account)
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            AdminKind::Aws {
                region, endpoint, ..
            } => f
                .debug_struct("Aws")
                .field("region", region)
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            AdminKind::Gcp {
                service_account_path,
                location,
                ..
            } => f
                .debug_struct("Gcp")
                .field("service_account_path", service_account_path)
                .field("location", location)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Deserialize)]
struct ServiceAccountFile {
    project_id: String,
    #[serde(default)]
    gcs_base_url: Option<String>,
}

#[derive(Serialize)]
struct NewGcsBucket<'a> {
    name: &'a str,
    location: &'a str,
}

fn rejected(action: &str, status: StatusCode, body: &str) -> String {
    match body.trim() {
        "" => format!("{action} returned {status}"),
        body => format!("{action} returned {status}: {body}"),
    }
}

fn http_error(e: reqwest::Error) -> String {
    e.without_url().to_string()
}

/// Body of an S3 CreateBucket request.
fn location_constraint(region: &str) -> Option<String> {
    (region != AWS_DEFAULT_REGION).then(|| {
        format!(
            "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <LocationConstraint>{region}</LocationConstraint>\
             </CreateBucketConfiguration>"
        )
    })
}

impl BucketAdmin {
    /// `endpoint` is the blob service root, e.g. `https://<account>.blob.core.windows.net`.
    pub fn azure(
        credentials: AzureCredentialProvider,
        account: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            kind: AdminKind::Azure {
                credentials,
                account: account.into(),
                endpoint: endpoint.into(),
            },
        }
    }

    /// `endpoint` is the path-style service root, e.g. `https://s3.<region>.amazonaws.com`.
    pub fn aws(
        credentials: AwsCredentialProvider,
        region: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            kind: AdminKind::Aws {
                credentials,
                region: region.into(),
                endpoint: endpoint.into(),
            },
        }
    }

    /// The project comes from the service account file, as does the API root
    /// when the file carries a `gcs_base_url`.
    pub fn gcp(
        credentials: GcpCredentialProvider,
        service_account_path: impl Into<PathBuf>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            kind: AdminKind::Gcp {
                credentials,
                service_account_path: service_account_path.into(),
                location: location.into(),
            },
        }
    }

    pub async fn ensure(
        &self,
        provider: &'static str,
        bucket: &str,
    ) -> Result<BucketStatus, UploadError> {
        let result = match &self.kind {
            AdminKind::Azure {
                credentials,
                account,
                endpoint,
            } => self.ensure_azure(credentials, account, endpoint, bucket).await,
            AdminKind::Aws {
                credentials,
                region,
                endpoint,
            } => self.ensure_aws(credentials, region, endpoint, bucket).await,
            AdminKind::Gcp {
                credentials,
                service_account_path,
                location,
            } => {
                self.ensure_gcp(credentials, service_account_path, location, bucket)
                    .await
            }
        };

        result.map_err(|reason| UploadError::Bucket {
            provider,
            bucket: bucket.to_string(),
            reason,
        })
    }

    async fn send(&self, request: Request) -> Result<(StatusCode, String), String> {
        let response = self.client.execute(request).await.map_err(http_error)?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    async fn ensure_azure(
        &self,
        credentials: &AzureCredentialProvider,
        account: &str,
        endpoint: &str,
        container: &str,
    ) -> Result<BucketStatus, String> {
        let credential = credentials
            .get_credential()
            .await
            .map_err(|e| e.to_string())?;
        let authorizer = AzureAuthorizer::new(&credential, account);
        let url = format!("{endpoint}/{container}?restype=container");

        let mut head = self
            .client
            .request(Method::HEAD, &url)
            .build()
            .map_err(http_error)?;
        authorizer.authorize(&mut head);
        match self.send(head).await? {
            (status, _) if status.is_success() => return Ok(BucketStatus::Existing),
            (StatusCode::NOT_FOUND, _) => {}
            (status, body) => return Err(rejected("container lookup", status, &body)),
        }

        let mut create = self
            .client
            .request(Method::PUT, &url)
            .header(CONTENT_LENGTH, "0")
            .body(Vec::new())
            .build()
            .map_err(http_error)?;
        authorizer.authorize(&mut create);
        match self.send(create).await? {
            (status, _) if status.is_success() => Ok(BucketStatus::Created),
            (StatusCode::CONFLICT, body) if body.contains("ContainerAlreadyExists") => {
                Ok(BucketStatus::Existing)
            }
            (status, body) => Err(rejected("container creation", status, &body)),
        }
    }

    async fn ensure_aws(
        &self,
        credentials: &AwsCredentialProvider,
        region: &str,
        endpoint: &str,
        bucket: &str,
    ) -> Result<BucketStatus, String> {
        let credential = credentials
            .get_credential()
            .await
            .map_err(|e| e.to_string())?;
        let authorizer = AwsAuthorizer::new(&credential, "s3", region);
        let url = format!("{endpoint}/{bucket}");

        let mut head = self
            .client
            .request(Method::HEAD, &url)
            .build()
            .map_err(http_error)?;
        authorizer.authorize(&mut head, None);
        match self.send(head).await? {
            (status, _) if status.is_success() => return Ok(BucketStatus::Existing),
            (StatusCode::NOT_FOUND, _) => {}
            (status, body) => return Err(rejected("bucket lookup", status, &body)),
        }

        let mut create = self
            .client
            .request(Method::PUT, &url)
            .body(location_constraint(region).unwrap_or_default())
            .build()
            .map_err(http_error)?;
        authorizer.authorize(&mut create, None);
        match self.send(create).await? {
            (status, _) if status.is_success() => Ok(BucketStatus::Created),
            (StatusCode::CONFLICT, body) if body.contains("BucketAlreadyOwnedByYou") => {
                Ok(BucketStatus::Existing)
            }
            (status, body) => Err(rejected("bucket creation", status, &body)),
        }
    }

    async fn ensure_gcp(
        &self,
        credentials: &GcpCredentialProvider,
        service_account_path: &Path,
        location: &str,
        bucket: &str,
    ) -> Result<BucketStatus, String> {
        let raw = tokio::fs::read(service_account_path)
            .await
            .map_err(|e| format!("cannot read {}: {e}", service_account_path.display()))?;
        let account: ServiceAccountFile = serde_json::from_slice(&raw)
            .map_err(|e| format!("invalid service account file: {e}"))?;
        let api = account
            .gcs_base_url
            .as_deref()
            .unwrap_or(GCS_API)
            .trim_end_matches('/');

        let credential = credentials
            .get_credential()
            .await
            .map_err(|e| e.to_string())?;
        let authorize = |builder: reqwest::RequestBuilder| {
            // Empty when oauth is disabled in the service account file.
            if credential.bearer.is_empty() {
                builder
            } else {
                builder.bearer_auth(&credential.bearer)
            }
        };

        let lookup = authorize(
            self.client
                .request(Method::GET, format!("{api}/storage/v1/b/{bucket}")),
        )
        .build()
        .map_err(http_error)?;
        match self.send(lookup).await? {
            (status, _) if status.is_success() => return Ok(BucketStatus::Existing),
            (StatusCode::NOT_FOUND, _) => {}
            (status, body) => return Err(rejected("bucket lookup", status, &body)),
        }

        let create = authorize(
            self.client
                .request(Method::POST, format!("{api}/storage/v1/b"))
                .query(&[("project", account.project_id.as_str())])
                .json(&NewGcsBucket {
                    name: bucket,
                    location,
                }),
        )
        .build()
        .map_err(http_error)?;
        match self.send(create).await? {
            (status, _) if status.is_success() => Ok(BucketStatus::Created),
            (StatusCode::CONFLICT, body) if body.contains("already own") => {
                Ok(BucketStatus::Existing)
            }
            (status, body) => Err(rejected("bucket creation", status, &body)),
        }
    }
}
