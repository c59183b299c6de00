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

//! Defines a [FrameError] for representing failures in planning, reading,
//! executing and writing a [DataFrame](crate::DataFrame).
use std::error::Error;
use std::fmt::Debug;
use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

#[cfg(feature = "datafusion")]
use datafusion::error::DataFusionError;

/// Different `DataFrame` Error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Analysis Exception: {0}")]
    AnalysisException(String),

    #[error("Apache Arrow Error: {0}")]
    ArrowError(#[from] ArrowError),

    #[error("CSV Error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("External Error: {0}")]
    ExternalError(Box<dyn Error + Send + Sync>),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("Io Error: {0}")]
    IoError(String, #[source] std::io::Error),

    #[error("Malformed record at {path}:{line}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Path already exists: {0}")]
    PathAlreadyExists(String),

    #[error("Session {0} has been stopped")]
    SessionClosed(String),

    #[error("Not Yet Implemented: {0}")]
    NotYetImplemented(String),
}

impl FrameError {
    /// Wraps an external error in an `FrameError`.
    pub fn from_external_error(error: Box<dyn Error + Send + Sync>) -> Self {
        Self::ExternalError(error)
    }

    /// Attaches the path that was being read or written to an io error.
    pub(crate) fn io(path: impl AsRef<std::path::Path>, error: std::io::Error) -> Self {
        FrameError::IoError(format!("{}: {}", path.as_ref().display(), error), error)
    }
}

impl From<std::io::Error> for FrameError {
    fn from(error: std::io::Error) -> Self {
        FrameError::IoError(error.to_string(), error)
    }
}

impl From<std::str::Utf8Error> for FrameError {
    fn from(error: std::str::Utf8Error) -> Self {
        FrameError::AnalysisException(error.to_string())
    }
}

impl From<std::string::FromUtf8Error> for FrameError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        FrameError::AnalysisException(error.to_string())
    }
}

impl From<tokio::task::JoinError> for FrameError {
    fn from(error: tokio::task::JoinError) -> Self {
        FrameError::from_external_error(Box::new(error))
    }
}

#[cfg(feature = "datafusion")]
impl From<DataFusionError> for FrameError {
    fn from(value: DataFusionError) -> Self {
        FrameError::AnalysisException(format!(
            "Error converting to DataFusion DataFrame: {value}"
        ))
    }
}
