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

//! CSV files as a source and sink of record batches

pub(crate) mod reader;
pub(crate) mod writer;

use std::collections::HashMap;

use crate::errors::FrameError;

/// Option lookup with case-insensitive keys
pub(crate) struct Options {
    values: HashMap<String, String>,
}

impl Options {
    pub(crate) fn new(options: &HashMap<String, String>) -> Options {
        Options {
            values: options
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    pub(crate) fn get_bool(&self, key: &str, default: bool) -> Result<bool, FrameError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(FrameError::InvalidArgument(format!(
                "{key} flag can be true or false, found: {value}"
            ))),
        }
    }

    /// A single-byte character option such as a delimiter or quote
    pub(crate) fn get_byte(&self, key: &str) -> Result<Option<u8>, FrameError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };

        match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(Some(*byte)),
            // written out escapes, e.g. from a shell
            [b'\\', b't'] => Ok(Some(b'\t')),
            _ => Err(FrameError::InvalidArgument(format!(
                "{key} must be a single ASCII character, found: {value:?}"
            ))),
        }
    }

    pub(crate) fn get_usize(&self, key: &str) -> Result<Option<usize>, FrameError> {
        self.get(key)
            .map(|value| {
                value.trim().parse::<usize>().map_err(|_| {
                    FrameError::InvalidArgument(format!(
                        "{key} must be a non-negative integer, found: {value}"
                    ))
                })
            })
            .transpose()
    }

    /// `sep` with `delimiter` as its alias
    pub(crate) fn delimiter(&self) -> Result<u8, FrameError> {
        Ok(self
            .get_byte("sep")?
            .or(self.get_byte("delimiter")?)
            .unwrap_or(b','))
    }
}
