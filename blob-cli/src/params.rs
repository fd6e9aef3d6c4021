use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub const DEFAULT_UPLOAD_FILE: &str = "generated-image.png";
pub const DEFAULT_BLOB_NAME: &str = "generated-image.png";
pub const DEFAULT_DOWNLOAD_FILE: &str = "generated-image_down.png";

#[derive(Parser, Debug)]
#[command(name = "blob", about = "Upload, download or delete a single blob")]
pub struct Args {
    /// Storage connection string (account name, key and endpoint)
    #[clap(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    pub(crate) connection_string: Option<String>,

    /// Container holding the blob
    #[clap(long, env = "AZURE_STORAGE_CONTAINER")]
    pub(crate) container: String,

    #[clap(long, value_enum, env = "BLOB_BACKEND", default_value_t = Backend::Azure)]
    pub(crate) backend: Backend,

    /// Directory holding container directories for the local backend
    #[clap(long, env = "BLOB_LOCAL_ROOT", default_value = ".")]
    pub(crate) local_root: PathBuf,

    /// Always exit with status 0, even when the operation failed
    #[clap(long)]
    pub(crate) exit_zero: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Azure,
    Local,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Upload a local file as a blob
    Upload {
        #[clap(long, default_value = DEFAULT_UPLOAD_FILE)]
        file: PathBuf,
        /// Blob name, defaults to the file name
        #[clap(long)]
        blob: Option<String>,
        /// Fail instead of replacing an existing blob
        #[clap(long)]
        no_overwrite: bool,
    },
    /// Download a blob to a local file
    Download {
        #[clap(long, default_value = DEFAULT_BLOB_NAME)]
        blob: String,
        #[clap(long, default_value = DEFAULT_DOWNLOAD_FILE)]
        file: PathBuf,
    },
    /// Delete a blob
    Delete {
        #[clap(long, default_value = DEFAULT_BLOB_NAME)]
        blob: String,
    },
}

impl Command {
    /// Remote blob name the command operates on.
    pub fn blob_name(&self) -> String {
        match self {
            Command::Upload { file, blob, .. } => blob.clone().unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.to_string_lossy().into_owned())
            }),
            Command::Download { blob, .. } | Command::Delete { blob } => blob.clone(),
        }
    }
}
