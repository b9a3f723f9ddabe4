//! Command handlers.

use super::commands::{Commands, OutputFormat};
use std::path::Path;
use vitrine::{
    ImageRecord, ImageStore, StatusSnapshot, StoreConfig, StoreError, StoreErrorKind,
    VitrineResult,
};

/// Resolve configuration from an explicit file or the layered defaults.
pub fn load_config(path: Option<&Path>) -> VitrineResult<StoreConfig> {
    match path {
        Some(path) => StoreConfig::from_file(path),
        None => StoreConfig::load(),
    }
}

/// Run one command against an open store.
pub async fn handle_command(store: &ImageStore, command: Commands) -> VitrineResult<()> {
    match command {
        Commands::Upload { file, mime, name } => {
            upload(store, &file, mime.as_deref(), name.as_deref()).await
        }
        Commands::List { format } => {
            list(&store.list(), format)?;
            Ok(())
        }
        Commands::Get { sequence, out } => {
            let (bytes, record) = store.get(sequence).await?;
            write_out(&out, &bytes).await?;
            println!(
                "Wrote #{} ({}) to {}",
                sequence,
                record.filename(),
                out.display()
            );
            Ok(())
        }
        Commands::Source { sequence, out } => {
            let (bytes, _) = store.get_source(sequence).await?;
            write_out(&out, &bytes).await?;
            println!("Wrote source of #{} to {}", sequence, out.display());
            Ok(())
        }
        Commands::Delete { sequence } => {
            store.delete(sequence).await?;
            println!("Deleted #{}", sequence);
            Ok(())
        }
        Commands::Clear => {
            let count = store.clear_all().await?;
            println!("Deleted {} images", count);
            Ok(())
        }
        Commands::Status { format } => {
            status(&store.status(), format)?;
            Ok(())
        }
    }
}

async fn upload(
    store: &ImageStore,
    file: &Path,
    mime: Option<&str>,
    name: Option<&str>,
) -> VitrineResult<()> {
    let payload = tokio::fs::read(file)
        .await
        .map_err(|e| StoreError::io(format!("read {}", file.display()), e))?;
    let name = name.or_else(|| file.file_name().and_then(|n| n.to_str()));

    let record = store.upload(payload, mime, name).await?;
    println!(
        "Stored #{} as {} ({} bytes)",
        record.sequence(),
        record.filename(),
        record.byte_size()
    );
    Ok(())
}

async fn write_out(path: &Path, bytes: &[u8]) -> VitrineResult<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| StoreError::io(format!("write {}", path.display()), e))?;
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> VitrineResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        StoreError::new(StoreErrorKind::Io(format!("serialize output: {}", e))).into()
    })
}

fn list(records: &[ImageRecord], format: OutputFormat) -> VitrineResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(&records)?),
        OutputFormat::Human => {
            println!(
                "{:>6}  {:<12}  {:>10}  {:<20}  {}",
                "SEQ", "KIND", "BYTES", "CREATED", "NAME"
            );
            println!("{:-<80}", "");
            for record in records {
                println!(
                    "{:>6}  {:<12}  {:>10}  {:<20}  {}",
                    record.sequence(),
                    record.source_kind().to_string(),
                    record.byte_size(),
                    record.created_at().format("%Y-%m-%d %H:%M:%S"),
                    record.filename()
                );
            }
            println!("Total: {} images", records.len());
        }
    }
    Ok(())
}

fn status(snapshot: &StatusSnapshot, format: OutputFormat) -> VitrineResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(snapshot)?),
        OutputFormat::Human => {
            println!("Images:        {}/{}", snapshot.count(), snapshot.max_images());
            println!("Full:          {}", snapshot.is_full());
            println!("Next sequence: {}", snapshot.next_sequence());
        }
    }
    Ok(())
}
