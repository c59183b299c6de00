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

//! DataFrameReader & DataFrameWriter representations

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use arrow::datatypes::SchemaRef;
use tracing::info;

use crate::conf::MAX_RECORDS_PER_FILE;
use crate::datasource::writer::{self, CsvWriteConfig};
use crate::errors::FrameError;
use crate::plan::{LogicalPlanBuilder, Relation};
use crate::session::Session;
use crate::DataFrame;

const CSV_FORMAT: &str = "csv";

/// How the reader treats records that do not fit the schema
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Keep the record: missing fields become null, extra fields are dropped
    /// and values that cannot be converted become null
    #[default]
    Permissive,
    /// Discard the record
    DropMalformed,
    /// Abort the read on the first malformed record
    FailFast,
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseMode::Permissive => "PERMISSIVE",
            ParseMode::DropMalformed => "DROPMALFORMED",
            ParseMode::FailFast => "FAILFAST",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ParseMode {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PERMISSIVE" => Ok(ParseMode::Permissive),
            "DROPMALFORMED" => Ok(ParseMode::DropMalformed),
            "FAILFAST" => Ok(ParseMode::FailFast),
            other => Err(FrameError::InvalidArgument(format!(
                "Unknown parse mode: {other}. Accepted modes are PERMISSIVE, DROPMALFORMED and FAILFAST"
            ))),
        }
    }
}

/// Specifies the behavior when data already exists at the output path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveMode {
    Append,
    Overwrite,
    #[default]
    ErrorIfExists,
    Ignore,
}

/// A trait used to convert to the expected Options for readwriters
///
/// This sets multiple options at once using a HashMap
pub trait ConfigOpts {
    fn to_options(&self) -> HashMap<String, String>;
}

#[macro_export]
macro_rules! define_file_options {
    (
        $(#[doc = $struct_d:tt])* // Struct-level documentation attributes
        $vis:vis struct $struct_name:ident {
            // Custom fields with options
            $(
                $field_name:ident : $field_type:ty,
                camel_case = $camel_case:expr
            )*$(,)*
        }
    ) => {

        $(#[doc = $struct_d])* // Apply struct documentation
        #[derive(Debug, Clone, Default)]
        $vis struct $struct_name {
            // Custom fields
            $(
               $field_name: Option<$field_type>,
            )*
        }

        impl $struct_name {
            // Builder methods for custom fields
            $(
                pub fn $field_name(mut self, value: $field_type) -> Self {
                    self.$field_name = Some(value);
                    self
                }
            )*
        }

        impl ConfigOpts for $struct_name {
            fn to_options(&self) -> HashMap<String, String> {
                let mut options: HashMap<String, String> = HashMap::new();

                $(
                    if let Some(value) = &self.$field_name {
                        options.insert(
                            $camel_case.to_string(),
                            value.to_string()
                        );
                    }
                )*

                options
            }
        }
    };
}

define_file_options! {
    /// A struct that represents options for reading and writing CSV files.
    ///
    /// Unset options fall back to the reader or writer defaults.
    ///
    /// # Fields
    /// - `sep`: Character used to separate fields. Default is a comma (`,`).
    /// - `delimiter`: Alternative name for `sep`.
    /// - `quote`: Character used for quoting strings. Default is a double quote (`"`).
    /// - `escape`: Character used to escape quotes inside quoted strings. Default is a backslash (`\`).
    ///   Setting it to the quote character means quotes are escaped by doubling them.
    /// - `comment`: Character that denotes the start of a comment line (read only).
    /// - `header`: Whether the first line is a header that contains column names. Default is `false`.
    /// - `infer_schema`: Whether to infer column types from the data. Default is `false` (read only).
    /// - `null_value`: String representation of a null value. Default is the empty string.
    /// - `mode`: Handling of malformed records, see [ParseMode] (read only).
    /// - `multi_line`: Whether quoted values may span multiple lines. Default is `false` (read only).
    /// - `ignore_leading_white_space`: Whether to trim leading white space of values (read only).
    /// - `ignore_trailing_white_space`: Whether to trim trailing white space of values (read only).
    /// - `max_records_per_file`: Maximum number of records written per part file, `0` means unlimited (write only).
    ///
    /// # Example
    /// ```
    /// let options = CsvOptions::default()
    ///     .header(true)
    ///     .infer_schema(true)
    ///     .escape('"')
    ///     .multi_line(true)
    ///     .mode(ParseMode::Permissive);
    ///
    /// let df = spark.read().csv(["/path/to/csv"], options)?;
    /// ```
    pub struct CsvOptions {
        sep : char, camel_case = "sep"
        delimiter : char, camel_case = "delimiter"
        quote : char, camel_case = "quote"
        escape : char, camel_case = "escape"
        comment : char, camel_case = "comment"
        header : bool, camel_case = "header"
        infer_schema : bool, camel_case = "inferSchema"
        null_value : String, camel_case = "nullValue"
        mode : ParseMode, camel_case = "mode"
        multi_line : bool, camel_case = "multiLine"
        ignore_leading_white_space : bool, camel_case = "ignoreLeadingWhiteSpace"
        ignore_trailing_white_space : bool, camel_case = "ignoreTrailingWhiteSpace"
        max_records_per_file : usize, camel_case = "maxRecordsPerFile"
    }
}

/// DataFrameReader represents the entrypoint to create a DataFrame
/// from a specific file format.
#[derive(Clone, Debug)]
pub struct DataFrameReader {
    session: Session,
    format: Option<String>,
    schema: Option<SchemaRef>,
    read_options: HashMap<String, String>,
}

impl DataFrameReader {
    /// Create a new DataFrameReader with a [Session]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            format: None,
            schema: None,
            read_options: HashMap::new(),
        }
    }

    /// Specifies the input data source format
    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Add an input option for the underlying data source
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.read_options.insert(key.to_string(), value.to_string());
        self
    }

    /// Use a fixed schema instead of inferring one. Fields are matched to
    /// the columns of the files by position.
    pub fn schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set many input options based on an iterator of (key/value pairs) for the underlying data source
    pub fn options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.read_options = options
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();

        self
    }

    /// Loads data from a data source and returns it as a [DataFrame]
    ///
    /// Every path must exist when `load` is called. Nothing is read until an
    /// action is called on the returned [DataFrame].
    ///
    /// Example:
    /// ```rust
    /// let path = vec!["some/dir/path/"];
    ///
    /// // returns a DataFrame from a csv file with a header from a the specific path
    /// let mut df = spark.read().format("csv").option("header", "true").load(path);
    /// ```
    pub fn load<'a, I>(self, paths: I) -> Result<DataFrame, FrameError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.session.check_active()?;

        let format = self.format.unwrap_or_else(|| CSV_FORMAT.to_string());

        if !format.eq_ignore_ascii_case(CSV_FORMAT) {
            return Err(FrameError::InvalidArgument(format!(
                "Unsupported data source format: {format}"
            )));
        }

        let paths: Vec<String> = paths.into_iter().map(|p| p.to_string()).collect();

        if paths.is_empty() {
            return Err(FrameError::InvalidArgument(
                "At least one path is required".to_string(),
            ));
        }

        if let Some(missing) = paths.iter().find(|p| !Path::new(p.as_str()).exists()) {
            return Err(FrameError::PathNotFound(missing.clone()));
        }

        let logical_plan = LogicalPlanBuilder::new(Relation::Read {
            format,
            paths,
            schema: self.schema,
            options: self.read_options,
        });

        Ok(DataFrame::new(self.session, logical_plan))
    }

    /// Reads data from CSV files with the specified options.
    pub fn csv<'a, C, I>(mut self, paths: I, config: C) -> Result<DataFrame, FrameError>
    where
        C: ConfigOpts,
        I: IntoIterator<Item = &'a str>,
    {
        self.format = Some(CSV_FORMAT.to_string());
        self.read_options.extend(config.to_options());
        self.load(paths)
    }
}

/// DataFrameWriter provides the ability to output a [DataFrame]
/// to a directory of delimited files
pub struct DataFrameWriter {
    dataframe: DataFrame,
    format: Option<String>,
    mode: SaveMode,
    write_options: HashMap<String, String>,
}

impl DataFrameWriter {
    /// Create a new DataFrameWriter from a provided [DataFrame]
    ///
    /// # Defaults
    /// - `format`: None (csv),
    /// - `mode`: [SaveMode::ErrorIfExists],
    /// - `write_options`: HashMap::new()
    ///
    pub fn new(dataframe: DataFrame) -> Self {
        Self {
            dataframe,
            format: None,
            mode: SaveMode::ErrorIfExists,
            write_options: HashMap::new(),
        }
    }

    /// Target format to output the [DataFrame]
    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Specifies the behavior when data already exists
    pub fn mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add an output option for the underlying data source
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.write_options
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Set many output options based on an iterator of (key/value pairs) for the underlying data source
    pub fn options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.write_options = options
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        self
    }

    /// Save the contents of the [DataFrame] to a directory of part files.
    ///
    /// The existing-data check of the [SaveMode] happens before the
    /// [DataFrame] is executed.
    pub async fn save(self, path: &str) -> Result<(), FrameError> {
        let format = self.format.as_deref().unwrap_or(CSV_FORMAT);

        if !format.eq_ignore_ascii_case(CSV_FORMAT) {
            return Err(FrameError::InvalidArgument(format!(
                "Unsupported data source format: {format}"
            )));
        }

        if path.is_empty() {
            return Err(FrameError::InvalidArgument(
                "Can not create a Path from an empty string".to_string(),
            ));
        }

        let session = self.dataframe.session().clone();
        session.check_active()?;

        let mut config = CsvWriteConfig::from_options(&self.write_options)?;
        if config.max_records_per_file.is_none() {
            config.max_records_per_file =
                Some(session.conf().get_usize(MAX_RECORDS_PER_FILE).await?);
        }

        let path = PathBuf::from(path);

        if !writer::check_output(&path, self.mode).await? {
            info!(path = %path.display(), "output exists, skipping write");
            return Ok(());
        }

        let batch = self.dataframe.collect().await?;

        writer::create_output(&path, self.mode).await?;
        let files = writer::write_csv(&batch, &path, &config).await?;

        info!(
            path = %path.display(),
            rows = batch.num_rows(),
            files = files.len(),
            "wrote csv output"
        );

        Ok(())
    }

    /// Writes the DataFrame to CSV files with the specified options.
    pub async fn csv<C: ConfigOpts>(mut self, path: &str, config: C) -> Result<(), FrameError> {
        self.format = Some(CSV_FORMAT.to_string());
        self.write_options.extend(config.to_options());
        self.save(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::record_batch::RecordBatch;

    use crate::functions::col;
    use crate::SessionBuilder;

    async fn setup() -> Session {
        SessionBuilder::default()
            .app_name("rust_readwriter")
            .build()
            .await
            .unwrap()
    }

    fn mock_data() -> RecordBatch {
        let name: ArrayRef = Arc::new(StringArray::from(vec!["Tom", "Alice", "Bob"]));
        let age: ArrayRef = Arc::new(Int64Array::from(vec![14, 23, 16]));

        RecordBatch::try_from_iter(vec![("name", name), ("age", age)]).unwrap()
    }

    fn write_file(dir: &Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_csv_options_to_options() {
        let opts = CsvOptions::default()
            .header(true)
            .escape('"')
            .mode(ParseMode::DropMalformed);

        let options = opts.to_options();

        assert_eq!(3, options.len());
        assert_eq!("true", options["header"]);
        assert_eq!("\"", options["escape"]);
        assert_eq!("DROPMALFORMED", options["mode"]);
    }

    #[test]
    fn test_parse_mode_from_str() -> Result<(), FrameError> {
        assert_eq!(ParseMode::Permissive, "permissive".parse()?);
        assert_eq!(ParseMode::FailFast, "FAILFAST".parse()?);
        assert!("LENIENT".parse::<ParseMode>().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_dataframe_read() -> Result<(), FrameError> {
        let spark = setup().await;
        let dir = tempfile::tempdir()?;

        let path = write_file(dir.path(), "people.csv", "name;age\nJorge;30\nBob;32\n");

        let df = spark
            .read()
            .format("csv")
            .option("header", "True")
            .option("delimiter", ";")
            .load([path.as_str()])?;

        let rows = df.collect().await?;

        assert_eq!(rows.num_rows(), 2);
        assert_eq!(rows.schema().field(0).name(), "name");
        Ok(())
    }

    #[tokio::test]
    async fn test_dataframe_read_csv_with_options() -> Result<(), FrameError> {
        let spark = setup().await;
        let dir = tempfile::tempdir()?;

        let path = write_file(
            dir.path(),
            "people.csv",
            "name;age\nJorge;30\nNULL;32\nbroken\n",
        );

        let opts = CsvOptions::default()
            .header(true)
            .null_value("NULL".to_string())
            .sep(';')
            .infer_schema(true)
            .mode(ParseMode::DropMalformed);

        let rows = spark.read().csv([path.as_str()], opts)?.collect().await?;

        let name: ArrayRef = Arc::new(StringArray::from(vec![Some("Jorge"), None]));
        let age: ArrayRef = Arc::new(arrow::array::Int32Array::from(vec![30, 32]));
        let expected =
            RecordBatch::try_from_iter_with_nullable(vec![
                ("name", name, true),
                ("age", age, true),
            ])?;

        assert_eq!(expected, rows);
        Ok(())
    }

    #[tokio::test]
    async fn test_dataframe_read_missing_path() {
        let spark = setup().await;

        let res = spark.read().load(["/definitely/not/here.csv"]);
        assert!(matches!(res, Err(FrameError::PathNotFound(_))));

        let res = spark.read().load([""]);
        assert!(matches!(res, Err(FrameError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn test_dataframe_read_unsupported_format() -> Result<(), FrameError> {
        let spark = setup().await;
        let dir = tempfile::tempdir()?;
        let path = write_file(dir.path(), "people.json", "{}");

        let res = spark.read().format("json").load([path.as_str()]);
        assert!(matches!(res, Err(FrameError::InvalidArgument(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_dataframe_write() -> Result<(), FrameError> {
        let spark = setup().await;
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("people");
        let out = out.to_str().unwrap();

        let df = spark.create_dataframe(&mock_data())?;

        df.clone()
            .write()
            .format("csv")
            .option("header", "true")
            .save(out)
            .await?;

        assert!(Path::new(out).join("_SUCCESS").exists());

        let res = spark
            .read()
            .option("header", "true")
            .option("inferSchema", "true")
            .load([out])?
            .sort([col("age")])
            .collect()
            .await?;

        let name: ArrayRef = Arc::new(StringArray::from(vec!["Tom", "Bob", "Alice"]));
        let age: ArrayRef = Arc::new(arrow::array::Int32Array::from(vec![14, 16, 23]));
        let expected =
            RecordBatch::try_from_iter_with_nullable(vec![
                ("name", name, true),
                ("age", age, true),
            ])?;

        assert_eq!(expected, res);
        Ok(())
    }

    #[tokio::test]
    async fn test_dataframe_write_modes() -> Result<(), FrameError> {
        let spark = setup().await;
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("people");
        let out = out.to_str().unwrap();

        let df = spark.create_dataframe(&mock_data())?;
        let opts = || CsvOptions::default().header(true);

        df.clone().write().csv(out, opts()).await?;

        // default mode refuses to touch existing output
        let res = df.clone().write().csv(out, opts()).await;
        assert!(matches!(res, Err(FrameError::PathAlreadyExists(_))));

        df.clone()
            .write()
            .mode(SaveMode::Ignore)
            .csv(out, opts())
            .await?;

        df.clone()
            .write()
            .mode(SaveMode::Append)
            .csv(out, opts())
            .await?;

        let read_back = || spark.read().option("header", "true").load([out]);
        assert_eq!(6, read_back()?.count().await?);

        df.clone()
            .write()
            .mode(SaveMode::Overwrite)
            .csv(out, opts())
            .await?;

        assert_eq!(3, read_back()?.count().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_dataframe_write_empty_path() -> Result<(), FrameError> {
        let spark = setup().await;
        let df = spark.create_dataframe(&mock_data())?;

        let res = df.write().save("").await;
        assert!(matches!(res, Err(FrameError::InvalidArgument(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_dataframe_write_max_records_per_file() -> Result<(), FrameError> {
        let spark = setup().await;
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("people");

        let df = spark.create_dataframe(&mock_data())?;

        df.write()
            .csv(
                out.to_str().unwrap(),
                CsvOptions::default().header(true).max_records_per_file(2),
            )
            .await?;

        let parts = std::fs::read_dir(&out)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("part-"))
            .count();

        assert_eq!(2, parts);
        Ok(())
    }
}
