//! Tile commands: fetch, inspect and purge single tiles.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tileforge::service::{
    ServiceError, TileResponse, TileService, STATUS_ACCEPTED, STATUS_FOUND, STATUS_NO_CONTENT,
};

use crate::error::CliError;

/// How often to check whether a slow generation has finished.
const GENERATION_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Requests answered 202 before giving up.
const MAX_ACCEPTED_ATTEMPTS: u32 = 5;

/// Request a tile and write its bytes to `output` or stdout.
///
/// A 202 means the generation outlived the wait timeout. The generation
/// task lives in this process, so the command waits for it to finish and
/// asks again rather than exiting and abandoning it.
pub async fn get(
    service: &TileService,
    coords: &str,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let response = request_until_settled(service, coords).await?;
    let status = response.status;

    if !response.is_success() && status != STATUS_FOUND {
        let message = response
            .body
            .into_bytes()
            .await
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        return Err(CliError::Request { status, message });
    }

    match status {
        STATUS_NO_CONTENT => {
            eprintln!("No {} tile exists at {}", service.kind(), coords);
            Ok(())
        }
        STATUS_ACCEPTED => Err(CliError::Request {
            status,
            message: format!(
                "tile still generating after {} attempts; generation stops when tileforge exits",
                MAX_ACCEPTED_ATTEMPTS
            ),
        }),
        STATUS_FOUND => {
            println!("{}", response.header("Location").unwrap_or_default());
            Ok(())
        }
        _ => {
            let etag = response.header("ETag").map(str::to_string);
            let bytes = response.body.into_bytes().await.map_err(ServiceError::from)?;
            write_output(output.as_deref(), &bytes)?;
            eprintln!(
                "{} tile {}: {} bytes{}",
                service.kind(),
                coords,
                bytes.len(),
                etag.map(|e| format!(", etag {}", e)).unwrap_or_default()
            );
            Ok(())
        }
    }
}

async fn request_until_settled(
    service: &TileService,
    coords: &str,
) -> Result<TileResponse, CliError> {
    let mut attempt = 1;
    loop {
        let response = service.request(coords).await;
        if response.status != STATUS_ACCEPTED || attempt >= MAX_ACCEPTED_ATTEMPTS {
            return Ok(response);
        }

        let key = service.parse_key(coords).map_err(ServiceError::from)?;
        eprintln!("Tile {} is still being generated; waiting", coords);
        while service.coordinator().is_in_flight(&key) {
            tokio::time::sleep(GENERATION_POLL_INTERVAL).await;
        }
        attempt += 1;
    }
}

fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<(), CliError> {
    match output {
        Some(path) => std::fs::write(path, bytes).map_err(|error| CliError::FileWrite {
            path: path.display().to_string(),
            error,
        }),
        None => std::io::stdout()
            .lock()
            .write_all(bytes)
            .map_err(|error| CliError::FileWrite {
                path: "<stdout>".to_string(),
                error,
            }),
    }
}

/// Print the index record for a tile.
pub async fn status(service: &TileService, coords: &str) -> Result<(), CliError> {
    let key = service.parse_key(coords).map_err(ServiceError::from)?;
    match service.status(coords).await? {
        Some(record) => {
            println!("Key:        {}", key);
            println!("Object:     {}", key.object_key());
            println!("Status:     {}", record.status);
            println!("Size:       {} bytes", record.size_bytes);
            println!(
                "Checksum:   {}",
                record.checksum.as_deref().unwrap_or("(none)")
            );
            println!("Updated:    {}", record.updated_at.to_rfc3339());
        }
        None => println!("{}: not indexed", key),
    }
    Ok(())
}

/// Remove a tile from the store and the index.
pub async fn purge(service: &TileService, coords: &str) -> Result<(), CliError> {
    let report = service.purge(coords).await?;
    println!(
        "Purged {} {}: record {}, object {}",
        service.kind(),
        coords,
        if report.record_deleted { "deleted" } else { "absent" },
        if report.object_deleted { "deleted" } else { "absent" },
    );
    Ok(())
}
