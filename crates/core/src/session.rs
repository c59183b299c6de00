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

//! Session and SessionBuilder. The entrypoint for creating a [DataFrame]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::conf::{RunTimeConfig, APP_NAME, CASE_SENSITIVE};
use crate::errors::FrameError;
use crate::execution::Executor;
use crate::plan::LogicalPlanBuilder;
use crate::readwriter::DataFrameReader;
use crate::DataFrame;

/// Builder for a [Session]
///
/// # Example
/// ```rust
/// let spark = SessionBuilder::default()
///     .app_name("popular-listings")
///     .config("engine.sql.caseSensitive", "true")
///     .build()
///     .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct SessionBuilder {
    app_name: Option<String>,
    configs: HashMap<String, String>,
}

impl SessionBuilder {
    pub fn new() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Sets a name for the application
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Sets a config option, see [conf](crate::conf) for the known keys
    pub fn config(mut self, key: &str, value: &str) -> Self {
        self.configs.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets many config options at once
    pub fn configs(mut self, configs: HashMap<String, String>) -> Self {
        self.configs.extend(configs);
        self
    }

    /// Creates the [Session]
    pub async fn build(self) -> Result<Session, FrameError> {
        let mut configs = self.configs;
        if let Some(name) = self.app_name {
            configs.insert(APP_NAME.to_string(), name);
        }

        let mut conf = RunTimeConfig::new();
        conf.set_configs(&configs).await?;

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            conf,
            active: Arc::new(AtomicBool::new(true)),
        };

        info!(
            session_id = %session.session_id,
            app_name = %session.conf.get(APP_NAME, None).await?,
            "session started"
        );

        Ok(session)
    }
}

/// The entry point to reading data and creating a [DataFrame]
///
/// Clones share the same configuration and lifecycle. Once stopped, no
/// clone can execute plans anymore.
#[derive(Clone, Debug)]
pub struct Session {
    session_id: String,
    conf: RunTimeConfig,
    active: Arc<AtomicBool>,
}

impl Session {
    /// Returns a [DataFrameReader] that can be used to read data in as a [DataFrame]
    pub fn read(&self) -> DataFrameReader {
        DataFrameReader::new(self.clone())
    }

    /// Creates a [DataFrame] from a [RecordBatch]
    pub fn create_dataframe(&self, data: &RecordBatch) -> Result<DataFrame, FrameError> {
        self.check_active()?;

        let logical_plan = LogicalPlanBuilder::local_relation(data);
        Ok(DataFrame::new(self.clone(), logical_plan))
    }

    /// Runtime configuration interface
    pub fn conf(&self) -> RunTimeConfig {
        self.conf.clone()
    }

    /// Return the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Stops the session. Stopping twice is a no-op.
    pub async fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!(session_id = %self.session_id, "session stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn check_active(&self) -> Result<(), FrameError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(FrameError::SessionClosed(self.session_id.clone()))
        }
    }

    /// Runs a plan to completion
    pub(crate) async fn execute(
        &self,
        plan: &LogicalPlanBuilder,
    ) -> Result<RecordBatch, FrameError> {
        self.check_active()?;

        let case_sensitive = self.conf.get_bool(CASE_SENSITIVE).await?;

        debug!(session_id = %self.session_id, "executing plan\n{plan}");

        Executor::new(case_sensitive).collect(plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arrow::array::{ArrayRef, Int64Array};

    use crate::functions::col;

    fn mock_data() -> RecordBatch {
        let id: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
        RecordBatch::try_from_iter(vec![("Id", id)]).unwrap()
    }

    #[tokio::test]
    async fn test_session_builder() -> Result<(), FrameError> {
        let spark = SessionBuilder::default()
            .app_name("rust_session")
            .config("engine.sql.files.maxRecordsPerFile", "10")
            .build()
            .await?;

        assert!(spark.is_active());
        assert!(Uuid::parse_str(spark.session_id()).is_ok());
        assert_eq!("rust_session", spark.conf().get(APP_NAME, None).await?);
        assert_eq!(
            "10",
            spark
                .conf()
                .get("engine.sql.files.maxRecordsPerFile", None)
                .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_case_sensitive_resolution() -> Result<(), FrameError> {
        let spark = SessionBuilder::default().build().await?;
        let df = spark.create_dataframe(&mock_data())?;

        assert_eq!(3, df.clone().select(col("id")).count().await?);

        spark.conf().set(CASE_SENSITIVE, "true").await?;

        let res = df.clone().select(col("id")).collect().await;
        assert!(matches!(res, Err(FrameError::AnalysisException(_))));
        assert_eq!(3, df.select(col("Id")).count().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_stopped_session() -> Result<(), FrameError> {
        let spark = SessionBuilder::default().build().await?;
        let df = spark.create_dataframe(&mock_data())?;

        let other = spark.clone();
        other.stop().await;
        other.stop().await;

        assert!(!spark.is_active());
        assert!(matches!(
            df.collect().await,
            Err(FrameError::SessionClosed(_))
        ));
        assert!(matches!(
            spark.create_dataframe(&mock_data()),
            Err(FrameError::SessionClosed(_))
        ));
        Ok(())
    }
}
