use std::fmt;

use async_trait::async_trait;
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient};

use crate::config::{validate_blob_name, ConnectionConfig, ConnectionString};
use crate::error::{BlobError, BlobResult};
use crate::store::BlobStore;

const CHINA_ENDPOINT_SUFFIX: &str = "core.chinacloudapi.cn";

/// A `BlobStore` that talks to Azure Blob Storage (or an Azurite emulator).
#[derive(Clone)]
pub struct AzureBlobStore {
    account_name: String,
    container: String,
    client: ContainerClient,
}

impl fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("account_name", &self.account_name)
            .field("container", &self.container)
            .finish()
    }
}

impl AzureBlobStore {
    /// Builds a container client from a validated configuration. No request is
    /// made here; the service validates the credentials on first use.
    pub fn new(config: &ConnectionConfig) -> BlobResult<Self> {
        let connection = config.connection();
        let container = config.container().to_string();

        let (account_name, builder) = if connection.use_development_storage {
            ("devstoreaccount1".to_string(), ClientBuilder::emulator())
        } else {
            let account_name = connection.account_name.clone().ok_or_else(|| {
                BlobError::InvalidConfig("connection string is missing AccountName".to_string())
            })?;
            let credentials = credentials(&account_name, connection)?;
            let location = cloud_location(&account_name, connection);
            (
                account_name,
                ClientBuilder::with_location(location, credentials),
            )
        };

        tracing::info!(
            "created blob client for {}/{}",
            account_name,
            container
        );

        Ok(Self {
            account_name,
            client: builder.container_client(container.clone()),
            container,
        })
    }
}

fn credentials(account_name: &str, connection: &ConnectionString) -> BlobResult<StorageCredentials> {
    match (&connection.account_key, &connection.sas_token) {
        (Some(key), _) if !key.is_empty() => Ok(StorageCredentials::access_key(
            account_name.to_string(),
            key.clone(),
        )),
        (_, Some(sas)) if !sas.is_empty() => StorageCredentials::sas_token(sas.clone())
            .map_err(|e| BlobError::InvalidConfig(format!("invalid SAS token: {}", e))),
        _ => Err(BlobError::InvalidConfig(
            "connection string needs an AccountKey or SharedAccessSignature".to_string(),
        )),
    }
}

fn cloud_location(account_name: &str, connection: &ConnectionString) -> CloudLocation {
    let account = account_name.to_string();
    if let Some(endpoint) = connection.blob_endpoint.as_deref() {
        return CloudLocation::Custom {
            account,
            uri: endpoint.trim_end_matches('/').to_string(),
        };
    }

    let protocol = connection
        .default_endpoints_protocol
        .as_deref()
        .unwrap_or("https");
    match connection.endpoint_suffix() {
        suffix if suffix.eq_ignore_ascii_case(crate::config::DEFAULT_ENDPOINT_SUFFIX)
            && protocol == "https" =>
        {
            CloudLocation::Public { account }
        }
        suffix if suffix.eq_ignore_ascii_case(CHINA_ENDPOINT_SUFFIX) && protocol == "https" => {
            CloudLocation::China { account }
        }
        suffix => CloudLocation::Custom {
            uri: format!("{}://{}.blob.{}", protocol, account, suffix),
            account,
        },
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn put_blob(&self, blob_name: &str, data: &[u8]) -> BlobResult<()> {
        validate_blob_name(blob_name)?;
        tracing::debug!(
            "PUT {}/{} ({} bytes)",
            self.container,
            blob_name,
            data.len()
        );
        self.client
            .blob_client(blob_name)
            .put_block_blob(data.to_vec())
            .await?;
        Ok(())
    }

    async fn get_blob(&self, blob_name: &str) -> BlobResult<Vec<u8>> {
        validate_blob_name(blob_name)?;
        tracing::debug!("GET {}/{}", self.container, blob_name);
        let data = self.client.blob_client(blob_name).get_content().await?;
        Ok(data)
    }

    async fn delete_blob(&self, blob_name: &str) -> BlobResult<()> {
        validate_blob_name(blob_name)?;
        tracing::debug!("DELETE {}/{}", self.container, blob_name);
        self.client.blob_client(blob_name).delete().await?;
        Ok(())
    }

    async fn blob_exists(&self, blob_name: &str) -> BlobResult<bool> {
        validate_blob_name(blob_name)?;
        let exists = self.client.blob_client(blob_name).exists().await?;
        Ok(exists)
    }
}
