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

//! Configuration for a session. Used to set various engine parameters as key-value pairs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::errors::FrameError;

/// Name of the application owning the session.
pub const APP_NAME: &str = "engine.app.name";

/// Whether column references are resolved case sensitively.
pub const CASE_SENSITIVE: &str = "engine.sql.caseSensitive";

/// Upper bound of rows written to one part file, `0` means unlimited.
pub const MAX_RECORDS_PER_FILE: &str = "engine.sql.files.maxRecordsPerFile";

const DEFAULTS: [(&str, &str); 3] = [
    (APP_NAME, "popular-listings"),
    (CASE_SENSITIVE, "false"),
    (MAX_RECORDS_PER_FILE, "0"),
];

// keys that are fixed once the session is built
const STATIC_KEYS: [&str; 1] = [APP_NAME];

/// User-facing configuration API, accessible through [Session::conf](crate::Session::conf).
///
/// Clones share the same underlying values.
///
/// # Example
/// ```rust
/// spark
///    .conf()
///    .set("engine.sql.caseSensitive", "true")
///    .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct RunTimeConfig {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl RunTimeConfig {
    pub fn new() -> RunTimeConfig {
        RunTimeConfig::default()
    }

    pub(crate) async fn set_configs(
        &mut self,
        map: &HashMap<String, String>,
    ) -> Result<(), FrameError> {
        let mut values = self.values.write().await;
        for (key, value) in map {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Sets the given runtime configuration property.
    pub async fn set(&mut self, key: &str, value: &str) -> Result<(), FrameError> {
        if !self.is_modifiable(key) {
            return Err(FrameError::InvalidArgument(format!(
                "Cannot modify the value of a static config: {key}"
            )));
        }

        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    /// Resets the configuration property for the given key.
    pub async fn unset(&mut self, key: &str) -> Result<(), FrameError> {
        if !self.is_modifiable(key) {
            return Err(FrameError::InvalidArgument(format!(
                "Cannot modify the value of a static config: {key}"
            )));
        }

        self.values.write().await.remove(key);

        Ok(())
    }

    /// Returns the value for the given key, falling back to `default` and
    /// then to the built-in default for known keys.
    pub async fn get(&self, key: &str, default: Option<&str>) -> Result<String, FrameError> {
        if let Some(value) = self.values.read().await.get(key) {
            return Ok(value.clone());
        }

        default
            .or_else(|| {
                DEFAULTS
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| *value)
            })
            .map(str::to_string)
            .ok_or_else(|| FrameError::InvalidArgument(format!("Config not set: {key}")))
    }

    /// Indicates whether the configuration property with the given key is modifiable in the current session.
    pub fn is_modifiable(&self, key: &str) -> bool {
        !STATIC_KEYS.contains(&key)
    }

    pub(crate) async fn get_bool(&self, key: &str) -> Result<bool, FrameError> {
        let value = self.get(key, None).await?;

        match value.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(FrameError::InvalidArgument(format!(
                "Unexpected value for boolean config {key}: {value}"
            ))),
        }
    }

    pub(crate) async fn get_usize(&self, key: &str) -> Result<usize, FrameError> {
        let value = self.get(key, None).await?;

        value.trim().parse::<usize>().map_err(|_| {
            FrameError::InvalidArgument(format!(
                "Unexpected value for integer config {key}: {value}"
            ))
        })
    }
}
