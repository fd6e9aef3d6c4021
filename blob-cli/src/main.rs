mod errors;
mod params;

use std::io::{self, Write};
use std::process::ExitCode;

use blob_store::config::validate_container_name;
use blob_store::{
    AzureBlobStore, BlobStores, BlobTransfer, ConnectionConfig, LocalFileBlobStore,
    TransferReport,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::errors::CliErr;
use crate::params::{Args, Backend, Command};

fn build_store(args: &Args) -> Result<BlobStores, CliErr> {
    match args.backend {
        Backend::Azure => {
            let connection_string = args
                .connection_string
                .as_deref()
                .ok_or(CliErr::MissingConnectionString)?;
            let config = ConnectionConfig::new(connection_string, args.container.as_str())?;
            Ok(BlobStores::Azure(AzureBlobStore::new(&config)?))
        }
        Backend::Local => {
            validate_container_name(&args.container)?;
            Ok(BlobStores::Local(LocalFileBlobStore::new(
                args.local_root.clone(),
                args.container.clone(),
            )))
        }
    }
}

fn announce(out: &mut impl Write, command: &Command) -> io::Result<()> {
    let blob_name = command.blob_name();
    match command {
        Command::Upload { .. } => {
            writeln!(out, "\nUploading to blob storage as blob:\n\t{}", blob_name)
        }
        Command::Download { .. } => {
            writeln!(out, "\nDownloading blob from blob storage:\n\t{}", blob_name)
        }
        Command::Delete { .. } => {
            writeln!(out, "\nDeleting a blob from blob storage:\n\t{}", blob_name)
        }
    }
}

/// Prints the report on success, or `Exception:` and the error text on failure.
fn report(out: &mut impl Write, outcome: &Result<TransferReport, CliErr>) -> io::Result<()> {
    match outcome {
        Ok(report) => writeln!(out, "{}", report),
        Err(e) => {
            writeln!(out, "Exception:")?;
            writeln!(out, "{}", e)
        }
    }
}

async fn run(args: &Args) -> Result<TransferReport, CliErr> {
    let stores = build_store(args)?;
    let transfer = BlobTransfer::new(stores.as_trait());

    if let Err(e) = announce(&mut io::stdout().lock(), &args.command) {
        tracing::warn!("could not write to stdout: {}", e);
    }
    let blob_name = args.command.blob_name();
    let transfer_report = match &args.command {
        Command::Upload {
            file, no_overwrite, ..
        } => transfer.upload(file, &blob_name, !no_overwrite).await?,
        Command::Download { file, .. } => transfer.download(&blob_name, file).await?,
        Command::Delete { .. } => transfer.delete(&blob_name).await?,
    };
    Ok(transfer_report)
}

/// Maps the outcome to a process status. `exit_zero` keeps the old
/// unattended behaviour of reporting success no matter what happened.
fn exit_status(outcome: &Result<TransferReport, CliErr>, exit_zero: bool) -> u8 {
    match outcome {
        Ok(_) => errors::EXIT_OK,
        Err(_) if exit_zero => errors::EXIT_OK,
        Err(e) => e.exit_code(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "backend {:?}, container {}, command {:?}",
        args.backend,
        args.container,
        args.command
    );

    let outcome = run(&args).await;
    if let Err(e) = &outcome {
        tracing::error!("operation failed: {}", e);
    }
    if let Err(e) = report(&mut io::stdout().lock(), &outcome) {
        tracing::warn!("could not write to stdout: {}", e);
    }
    ExitCode::from(exit_status(&outcome, args.exit_zero))
}
