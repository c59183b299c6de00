// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Writes a [RecordBatch] as a directory of CSV part files
//!
//! A finished output directory holds one or more `part-NNNNN-<uuid>.csv`
//! files and an empty `_SUCCESS` marker written last.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use tracing::debug;
use uuid::Uuid;

use super::Options;
use crate::errors::FrameError;
use crate::readwriter::SaveMode;

pub(crate) const SUCCESS_MARKER: &str = "_SUCCESS";

/// Serialization settings resolved from the writer options
#[derive(Clone, Debug)]
pub(crate) struct CsvWriteConfig {
    pub header: bool,
    pub delimiter: u8,
    pub quote: u8,
    pub escape: u8,
    pub null_value: String,
    /// `Some(0)` writes everything into a single part file
    pub(crate) max_records_per_file: Option<usize>,
}

impl CsvWriteConfig {
    pub(crate) fn from_options(options: &HashMap<String, String>) -> Result<Self, FrameError> {
        let opts = Options::new(options);

        Ok(Self {
            header: opts.get_bool("header", false)?,
            delimiter: opts.delimiter()?,
            quote: opts.get_byte("quote")?.unwrap_or(b'"'),
            escape: opts.get_byte("escape")?.unwrap_or(b'\\'),
            null_value: opts.get("nullValue").unwrap_or_default().to_string(),
            max_records_per_file: opts.get_usize("maxRecordsPerFile")?,
        })
    }

    fn records_per_file(&self, num_rows: usize) -> usize {
        match self.max_records_per_file {
            None | Some(0) => num_rows,
            Some(limit) => limit,
        }
    }
}

/// Applies the [SaveMode] to whatever is already at `path`.
///
/// Returns `false` when the write should be skipped.
pub(crate) async fn check_output(path: &Path, mode: SaveMode) -> Result<bool, FrameError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| FrameError::io(path, e))?;

    if !exists {
        return Ok(true);
    }

    match mode {
        SaveMode::ErrorIfExists => Err(FrameError::PathAlreadyExists(
            path.display().to_string(),
        )),
        SaveMode::Ignore => Ok(false),
        SaveMode::Append => {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| FrameError::io(path, e))?;

            if metadata.is_dir() {
                Ok(true)
            } else {
                Err(FrameError::InvalidArgument(format!(
                    "Can not append to {}: not a directory",
                    path.display()
                )))
            }
        }
        SaveMode::Overwrite => Ok(true),
    }
}

/// Prepares the output directory, clearing it first for [SaveMode::Overwrite].
///
/// Only [SaveMode::Append] writes into a directory that already exists.
pub(crate) async fn create_output(path: &Path, mode: SaveMode) -> Result<(), FrameError> {
    if mode == SaveMode::Overwrite {
        let removed = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => tokio::fs::remove_dir_all(path).await,
            Ok(_) => tokio::fs::remove_file(path).await,
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        };
        removed.map_err(|e| FrameError::io(path, e))?;
    }

    if mode == SaveMode::Append {
        return tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| FrameError::io(path, e));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FrameError::io(parent, e))?;
    }

    // the directory may have appeared since check_output
    tokio::fs::create_dir(path).await.map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => FrameError::PathAlreadyExists(path.display().to_string()),
        _ => FrameError::io(path, e),
    })
}

/// Writes `batch` into `path`, which must already exist.
///
/// At least one part file is written, so an empty batch still leaves a
/// header behind when headers are enabled.
pub(crate) async fn write_csv(
    batch: &RecordBatch,
    path: &Path,
    config: &CsvWriteConfig,
) -> Result<Vec<PathBuf>, FrameError> {
    let job_id = Uuid::new_v4();

    let num_rows = batch.num_rows();
    let per_file = config.records_per_file(num_rows);

    let mut chunks = Vec::new();
    let mut offset = 0;
    loop {
        let len = per_file.min(num_rows - offset);
        chunks.push(batch.slice(offset, len));
        offset += len;
        if offset >= num_rows || len == 0 {
            break;
        }
    }

    let encoded = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            chunks
                .iter()
                .map(|chunk| encode(chunk, &config))
                .collect::<Result<Vec<_>, FrameError>>()
        })
        .await??
    };

    let mut files = Vec::with_capacity(encoded.len());
    for (index, bytes) in encoded.into_iter().enumerate() {
        let file = path.join(format!("part-{index:05}-{job_id}.csv"));

        tokio::fs::write(&file, &bytes)
            .await
            .map_err(|e| FrameError::io(&file, e))?;

        debug!(path = %file.display(), bytes = bytes.len(), "wrote part file");
        files.push(file);
    }

    let marker = path.join(SUCCESS_MARKER);
    tokio::fs::write(&marker, b"")
        .await
        .map_err(|e| FrameError::io(&marker, e))?;

    Ok(files)
}

fn encode(batch: &RecordBatch, config: &CsvWriteConfig) -> Result<Vec<u8>, FrameError> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .with_header(config.header)
            .with_delimiter(config.delimiter)
            .with_quote(config.quote)
            .with_escape(config.escape)
            .with_double_quote(config.escape == config.quote)
            .with_null(config.null_value.clone())
            .build(&mut buf);

        writer.write(batch)?;
    }
    Ok(buf)
}
