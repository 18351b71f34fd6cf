use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::ObjectStore;

use crate::config::{AzureCredentials, StorageTarget};

use super::bucket::BucketAdmin;

const AZURE_EMULATOR_ACCOUNT: &str = "devstoreaccount1";
const AZURE_EMULATOR_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// The store uploads go through, plus the admin that creates its bucket.
#[derive(Debug)]
pub struct ProviderClient {
    pub store: Arc<dyn ObjectStore>,
    pub admin: BucketAdmin,
}

/// Builds the clients for one provider, scoped to `bucket`.
/// No request is made here; bad credentials surface on the bucket check.
pub fn build_client(target: &StorageTarget, bucket: &str) -> object_store::Result<ProviderClient> {
    match target {
        StorageTarget::Azure(credentials) => {
            let builder = MicrosoftAzureBuilder::new().with_container_name(bucket);
            let (builder, account, endpoint) = match credentials {
                AzureCredentials::AccountKey {
                    account,
                    access_key,
                } => (
                    builder.with_account(account).with_access_key(access_key),
                    account.clone(),
                    format!("https://{account}.blob.core.windows.net"),
                ),
                AzureCredentials::Emulator => (
                    builder.with_use_emulator(true),
                    AZURE_EMULATOR_ACCOUNT.to_string(),
                    AZURE_EMULATOR_ENDPOINT.to_string(),
                ),
            };
            let store = builder.build()?;
            let admin = BucketAdmin::azure(store.credentials().clone(), account, endpoint);
            Ok(ProviderClient {
                store: Arc::new(store),
                admin,
            })
        }
        StorageTarget::Aws {
            access_key_id,
            secret_access_key,
            region,
        } => {
            let store = AmazonS3Builder::new()
                .with_bucket_name(bucket)
                .with_region(region)
                .with_access_key_id(access_key_id)
                .with_secret_access_key(secret_access_key)
                .build()?;
            let admin = BucketAdmin::aws(
                store.credentials().clone(),
                region,
                format!("https://s3.{region}.amazonaws.com"),
            );
            Ok(ProviderClient {
                store: Arc::new(store),
                admin,
            })
        }
        StorageTarget::Gcp {
            service_account_path,
            region,
        } => {
            let store = GoogleCloudStorageBuilder::new()
                .with_bucket_name(bucket)
                .with_service_account_path(service_account_path.to_string_lossy())
                .build()?;
            let admin =
                BucketAdmin::gcp(store.credentials().clone(), service_account_path, region);
            Ok(ProviderClient {
                store: Arc::new(store),
                admin,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_aws_store_offline() {
        let target = StorageTarget::Aws {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
            region: "eu-west-1".to_string(),
        };
        assert!(build_client(&target, "nightly").is_ok());
    }

    #[test]
    fn test_aws_admin_targets_region_endpoint() {
        let target = StorageTarget::Aws {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
            region: "eu-west-1".to_string(),
        };
        let admin = format!("{:?}", build_client(&target, "nightly").unwrap().admin);
        assert!(admin.contains("https://s3.eu-west-1.amazonaws.com"));
        assert!(!admin.contains("wJalrXUtnFEMI"));
    }

    #[test]
    fn test_gcp_admin_uses_configured_region() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"private_key":"private_key","private_key_id":"id","client_email":"backup@example.com","project_id":"shop","disable_oauth":true}"#,
        )
        .unwrap();
        let target = StorageTarget::Gcp {
            service_account_path: PathBuf::from(file.path()),
            region: "EUROPE-WEST1".to_string(),
        };
        let admin = format!("{:?}", build_client(&target, "nightly").unwrap().admin);
        assert!(admin.contains("EUROPE-WEST1"));
    }

    #[test]
    fn test_build_azure_store_with_account_key() {
        let target = StorageTarget::Azure(AzureCredentials::AccountKey {
            account: "backups".to_string(),
            access_key: "c2VjcmV0LWtleQ==".to_string(),
        });
        assert!(build_client(&target, "nightly").is_ok());
    }

    #[test]
    fn test_build_azure_emulator_store() {
        let target = StorageTarget::Azure(AzureCredentials::Emulator);
        assert!(build_client(&target, "nightly").is_ok());
    }

    #[test]
    fn test_build_gcp_store_rejects_bad_service_account() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not json").unwrap();
        let target = StorageTarget::Gcp {
            service_account_path: PathBuf::from(file.path()),
            region: "us".to_string(),
        };
        assert!(build_client(&target, "nightly").is_err());
    }
}
