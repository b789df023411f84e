use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::db::SqliteStore;
use crate::error::{Result, ScrubError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

/// Where a command to clean comes from.
#[derive(Clone, Debug, Default)]
pub struct InputSource {
    /// File to read; `-` or `None` reads stdin.
    pub file: Option<PathBuf>,
    /// Command given inline with `-c`.
    pub command: Option<String>,
}

impl InputSource {
    pub fn inline(command: impl Into<String>) -> Self {
        Self {
            file: None,
            command: Some(command.into()),
        }
    }

    pub fn read(&self) -> Result<String> {
        if let Some(command) = &self.command {
            return Ok(command.clone());
        }
        match &self.file {
            Some(path) if path.as_os_str() != "-" => read_file(path),
            _ => {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| {
        ScrubError::InvalidArgs(format!("Failed to read {}: {}", path.display(), err))
    })
}

pub fn open_store(database: &Path) -> Result<SqliteStore> {
    SqliteStore::open(database)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
