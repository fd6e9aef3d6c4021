use std::fmt;

use crate::error::{BlobError, BlobResult};

pub const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
pub const MAX_BLOB_NAME_LEN: usize = 1024;

/// Parsed form of a storage connection string, e.g.
/// `DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=...;EndpointSuffix=core.windows.net`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    pub default_endpoints_protocol: Option<String>,
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub sas_token: Option<String>,
    pub endpoint_suffix: Option<String>,
    pub blob_endpoint: Option<String>,
    pub use_development_storage: bool,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> BlobResult<Self> {
        let mut parsed = ConnectionString::default();
        let mut seen_any = false;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            // Only split on the first '=', account keys end in base64 padding.
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                BlobError::InvalidConfig(format!(
                    "connection string segment '{}' is not a key=value pair",
                    segment
                ))
            })?;
            let value = value.trim().to_string();
            seen_any = true;

            match key.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => parsed.default_endpoints_protocol = Some(value),
                "accountname" => parsed.account_name = Some(value),
                "accountkey" => parsed.account_key = Some(value),
                "sharedaccesssignature" => parsed.sas_token = Some(value),
                "endpointsuffix" => parsed.endpoint_suffix = Some(value),
                "blobendpoint" => parsed.blob_endpoint = Some(value),
                "usedevelopmentstorage" => {
                    parsed.use_development_storage = value.eq_ignore_ascii_case("true")
                }
                other => tracing::debug!("ignoring connection string key {}", other),
            }
        }

        if !seen_any {
            return Err(BlobError::InvalidConfig(
                "connection string is empty".to_string(),
            ));
        }
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> BlobResult<()> {
        if self.use_development_storage {
            return Ok(());
        }
        match self.account_name.as_deref() {
            None | Some("") => {
                return Err(BlobError::InvalidConfig(
                    "connection string is missing AccountName".to_string(),
                ))
            }
            Some(_) => {}
        }
        let has_key = self.account_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_sas = self.sas_token.as_deref().is_some_and(|s| !s.is_empty());
        if !has_key && !has_sas {
            return Err(BlobError::InvalidConfig(
                "connection string needs an AccountKey or SharedAccessSignature".to_string(),
            ));
        }
        Ok(())
    }

    pub fn endpoint_suffix(&self) -> &str {
        self.endpoint_suffix
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ConnectionString")
            .field("default_endpoints_protocol", &self.default_endpoints_protocol)
            .field("account_name", &self.account_name)
            .field("account_key", &redact(&self.account_key))
            .field("sas_token", &redact(&self.sas_token))
            .field("endpoint_suffix", &self.endpoint_suffix)
            .field("blob_endpoint", &self.blob_endpoint)
            .field("use_development_storage", &self.use_development_storage)
            .finish()
    }
}

/// Credentials plus the one container every operation targets.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    connection: ConnectionString,
    container: String,
}

impl ConnectionConfig {
    pub fn new(connection_string: &str, container: impl Into<String>) -> BlobResult<Self> {
        let container = container.into();
        validate_container_name(&container)?;
        let connection = ConnectionString::parse(connection_string)?;
        Ok(Self {
            connection,
            container,
        })
    }

    pub fn connection(&self) -> &ConnectionString {
        &self.connection
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

/// Container names: 3-63 chars of lowercase letters, digits and single hyphens,
/// starting and ending with a letter or digit.
pub fn validate_container_name(name: &str) -> BlobResult<()> {
    let invalid = |why: &str| {
        Err(BlobError::InvalidConfig(format!(
            "invalid container name '{}': {}",
            name, why
        )))
    };

    if !(3..=63).contains(&name.len()) {
        return invalid("must be between 3 and 63 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return invalid("only lowercase letters, digits and hyphens are allowed");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return invalid("must start and end with a letter or digit");
    }
    if name.contains("--") {
        return invalid("consecutive hyphens are not allowed");
    }
    Ok(())
}

pub fn validate_blob_name(name: &str) -> BlobResult<()> {
    if name.is_empty() {
        return Err(BlobError::InvalidConfig(
            "blob name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_BLOB_NAME_LEN {
        return Err(BlobError::InvalidConfig(format!(
            "blob name is longer than {} characters",
            MAX_BLOB_NAME_LEN
        )));
    }
    if name.ends_with('.') || name.ends_with('/') {
        return Err(BlobError::InvalidConfig(format!(
            "blob name '{}' cannot end with '.' or '/'",
            name
        )));
    }
    Ok(())
}
