//! Storage command: direct object store access

use std::io::Write;

use crate::cli::{StorageArgs, StorageSubcommand};
use crate::config::Settings;
use crate::error::{self, Result};
use crate::{hash, storage};

pub fn run(settings: &Settings, args: StorageArgs) -> Result<()> {
    let store = storage::from_settings(&settings.storage)?;

    match args.command {
        StorageSubcommand::Get(get) => {
            let data = store.get(&get.key)?;
            match get.output {
                Some(path) => {
                    std::fs::write(&path, &data).map_err(|e| {
                        error::fs::write_failed(path.display().to_string(), e.to_string())
                    })?;
                    eprintln!("Wrote {} bytes to {}", data.len(), path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&data)?;
                    stdout.flush()?;
                }
            }
        }
        StorageSubcommand::Put(put) => {
            let data = std::fs::read(&put.file)
                .map_err(|e| error::fs::read_failed(put.file.display().to_string(), e.to_string()))?;
            let digest = hash::hash_file(&put.file)?;
            store.put(&put.key, &data)?;
            println!(
                "Stored {} bytes at {} ({digest})",
                data.len(),
                store.location(&put.key)
            );
        }
    }
    Ok(())
}
