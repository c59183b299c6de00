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

//! Reads delimited text files into a single [RecordBatch]

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Date32Builder, Float64Builder, Int32Builder, Int64Builder,
    StringBuilder, TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use tracing::{debug, warn};

use super::Options;
use crate::errors::FrameError;
use crate::readwriter::ParseMode;
use crate::types::{self, InferredType};

/// Parsing settings resolved from the reader options
#[derive(Clone, Debug)]
pub(crate) struct CsvReadConfig {
    pub delimiter: u8,
    pub quote: u8,
    pub escape: u8,
    pub comment: Option<u8>,
    pub header: bool,
    pub infer_schema: bool,
    pub null_value: String,
    pub mode: ParseMode,
    pub multi_line: bool,
    pub trim_leading: bool,
    pub trim_trailing: bool,
}

impl CsvReadConfig {
    pub(crate) fn from_options(options: &HashMap<String, String>) -> Result<Self, FrameError> {
        let opts = Options::new(options);

        Ok(Self {
            delimiter: opts.delimiter()?,
            quote: opts.get_byte("quote")?.unwrap_or(b'"'),
            escape: opts.get_byte("escape")?.unwrap_or(b'\\'),
            comment: opts.get_byte("comment")?,
            header: opts.get_bool("header", false)?,
            infer_schema: opts.get_bool("inferSchema", false)?,
            null_value: opts.get("nullValue").unwrap_or_default().to_string(),
            mode: opts
                .get("mode")
                .map(|mode| mode.parse::<ParseMode>())
                .transpose()?
                .unwrap_or_default(),
            multi_line: opts.get_bool("multiLine", false)?,
            trim_leading: opts.get_bool("ignoreLeadingWhiteSpace", false)?,
            trim_trailing: opts.get_bool("ignoreTrailingWhiteSpace", false)?,
        })
    }

    fn tokenizer(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(true)
            .comment(self.comment);

        // an escape equal to the quote is the doubled quote handled above
        if self.escape != self.quote {
            builder.escape(Some(self.escape));
        }
        builder
    }

    fn to_value(&self, mut raw: String) -> Option<String> {
        if self.trim_leading {
            raw = raw.trim_start().to_string();
        }
        if self.trim_trailing {
            raw.truncate(raw.trim_end().len());
        }

        if raw.is_empty() || raw == self.null_value {
            None
        } else {
            Some(raw)
        }
    }
}

struct RawRecord {
    line: u64,
    fields: Vec<String>,
}

struct Row<'a> {
    path: &'a Path,
    line: u64,
    fields: Vec<Option<String>>,
}

impl Row<'_> {
    fn malformed(&self, reason: String) -> FrameError {
        FrameError::MalformedRecord {
            path: self.path.to_path_buf(),
            line: self.line,
            reason,
        }
    }
}

/// Reads every file behind `paths` into one batch.
pub(crate) async fn read_csv(
    paths: &[String],
    schema: Option<SchemaRef>,
    options: &HashMap<String, String>,
) -> Result<RecordBatch, FrameError> {
    let config = CsvReadConfig::from_options(options)?;

    let files = list_files(paths).await?;

    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let data = tokio::fs::read(&file)
            .await
            .map_err(|e| FrameError::io(&file, e))?;
        debug!(path = %file.display(), bytes = data.len(), "read csv file");
        sources.push((file, data));
    }

    tokio::task::spawn_blocking(move || decode(&sources, schema, &config)).await?
}

/// Expands directories into the data files they hold. Files starting with
/// `_` or `.` are markers or hidden files and are skipped.
pub(crate) async fn list_files(paths: &[String]) -> Result<Vec<PathBuf>, FrameError> {
    let mut files = Vec::new();

    for path in paths {
        let path = PathBuf::from(path);

        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FrameError::PathNotFound(path.display().to_string()),
            _ => FrameError::io(&path, e),
        })?;

        if !metadata.is_dir() {
            files.push(path);
            continue;
        }

        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| FrameError::io(&path, e))?;

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FrameError::io(&path, e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('_') || name.starts_with('.') {
                continue;
            }

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FrameError::io(entry.path(), e))?;
            if file_type.is_file() {
                found.push(entry.path());
            }
        }

        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn tokenize(data: &[u8], config: &CsvReadConfig) -> Result<Vec<RawRecord>, FrameError> {
    if config.multi_line {
        return read_records(data, config, 0);
    }

    // one record per physical line
    let mut records = Vec::new();
    for (index, line) in data.split(|b| *b == b'\n').enumerate() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        records.extend(read_records(line, config, index as u64)?);
    }
    Ok(records)
}

fn read_records(
    data: &[u8],
    config: &CsvReadConfig,
    line_offset: u64,
) -> Result<Vec<RawRecord>, FrameError> {
    let mut reader = config.tokenizer().from_reader(data);

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_offset + record.position().map_or(1, |pos| pos.line());

        records.push(RawRecord {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(records)
}

pub(crate) fn decode(
    sources: &[(PathBuf, Vec<u8>)],
    schema: Option<SchemaRef>,
    config: &CsvReadConfig,
) -> Result<RecordBatch, FrameError> {
    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (path, data) in sources {
        let mut records = tokenize(data, config)?.into_iter();

        if config.header {
            // every file repeats the header, the first one names the columns
            if let Some(first) = records.next() {
                header.get_or_insert(first.fields);
            }
        }

        for record in records {
            rows.push(Row {
                path,
                line: record.line,
                fields: record
                    .fields
                    .into_iter()
                    .map(|field| config.to_value(field))
                    .collect(),
            });
        }
    }

    let width = match (&schema, &header) {
        (Some(schema), _) => schema.fields().len(),
        (None, Some(header)) => header.len(),
        (None, None) => rows.first().map_or(0, |row| row.fields.len()),
    };

    let mut repaired = 0usize;
    let mut dropped = 0usize;

    let mut kept = Vec::with_capacity(rows.len());
    for mut row in rows {
        if row.fields.len() != width {
            match config.mode {
                ParseMode::FailFast => {
                    return Err(row.malformed(format!(
                        "expected {width} fields, found {}",
                        row.fields.len()
                    )))
                }
                ParseMode::DropMalformed => {
                    dropped += 1;
                    continue;
                }
                ParseMode::Permissive => {
                    row.fields.resize(width, None);
                    repaired += 1;
                }
            }
        }
        kept.push(row);
    }

    let schema = match schema {
        Some(schema) => {
            if let Some(field) = schema
                .fields()
                .iter()
                .find(|field| !types::is_supported(field.data_type()))
            {
                return Err(FrameError::NotYetImplemented(format!(
                    "Reading csv column {} as {}",
                    field.name(),
                    field.data_type()
                )));
            }
            // values missing from a record always read as null
            let fields: Vec<Field> = schema
                .fields()
                .iter()
                .map(|field| (**field).clone().with_nullable(true))
                .collect();
            Arc::new(Schema::new(fields))
        }
        None => {
            let names = column_names(header.as_deref(), width);
            let data_types = if config.infer_schema {
                infer_types(&kept, width)
            } else {
                vec![DataType::Utf8; width]
            };

            let fields: Vec<Field> = names
                .into_iter()
                .zip(data_types)
                .map(|(name, data_type)| Field::new(name, data_type, true))
                .collect();
            Arc::new(Schema::new(fields))
        }
    };

    let mut builders = schema
        .fields()
        .iter()
        .map(|field| ColumnBuilder::new(field.data_type(), kept.len()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut num_rows = 0;
    let mut cells: Vec<Cell> = Vec::with_capacity(width);

    'rows: for row in &kept {
        cells.clear();
        let mut unconvertible = false;

        for (value, field) in row.fields.iter().zip(schema.fields()) {
            let Some(value) = value else {
                cells.push(Cell::Null);
                continue;
            };

            match Cell::parse(value, field.data_type()) {
                Some(cell) => cells.push(cell),
                None => match config.mode {
                    ParseMode::FailFast => {
                        return Err(row.malformed(format!(
                            "cannot read {value:?} as {} for column {}",
                            field.data_type(),
                            field.name()
                        )))
                    }
                    ParseMode::DropMalformed => {
                        dropped += 1;
                        continue 'rows;
                    }
                    ParseMode::Permissive => {
                        unconvertible = true;
                        cells.push(Cell::Null);
                    }
                },
            }
        }

        if unconvertible {
            repaired += 1;
        }

        for ((builder, cell), field) in builders
            .iter_mut()
            .zip(cells.drain(..))
            .zip(schema.fields())
        {
            builder.append(cell, field.name())?;
        }
        num_rows += 1;
    }

    if repaired > 0 || dropped > 0 {
        warn!(
            repaired,
            dropped,
            mode = %config.mode,
            "malformed csv records"
        );
    }

    let columns: Vec<ArrayRef> = builders.iter_mut().map(ColumnBuilder::finish).collect();

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Names from the header, `_c{index}` where there is none. Names that occur
/// more than once get their index appended.
fn column_names(header: Option<&[String]>, width: usize) -> Vec<String> {
    let names: Vec<String> = (0..width)
        .map(|i| match header.and_then(|header| header.get(i)) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("_c{i}"),
        })
        .collect();

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let duplicated = names
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.to_lowercase() == name.to_lowercase());

            if duplicated {
                format!("{name}{i}")
            } else {
                name.clone()
            }
        })
        .collect()
}

fn infer_types(rows: &[Row], width: usize) -> Vec<DataType> {
    let mut inferred = vec![InferredType::Null; width];

    for row in rows {
        for (slot, value) in inferred.iter_mut().zip(&row.fields) {
            if let Some(value) = value {
                if *slot != InferredType::String {
                    *slot = slot.merge(InferredType::of(value));
                }
            }
        }
    }

    inferred
        .into_iter()
        .map(InferredType::data_type)
        .collect()
}

/// A converted field value
enum Cell<'a> {
    Null,
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    Date32(i32),
    TimestampMicros(i64),
    Utf8(&'a str),
}

impl<'a> Cell<'a> {
    fn parse(value: &'a str, data_type: &DataType) -> Option<Cell<'a>> {
        match data_type {
            DataType::Int32 => value.parse().ok().map(Cell::Int32),
            DataType::Int64 => value.parse().ok().map(Cell::Int64),
            DataType::Float64 => value.parse().ok().map(Cell::Float64),
            DataType::Boolean => types::parse_bool(value).map(Cell::Boolean),
            DataType::Date32 => {
                types::parse_date(value).map(|date| Cell::Date32(Date32Type::from_naive_date(date)))
            }
            DataType::Timestamp(TimeUnit::Microsecond, None) => types::parse_timestamp(value)
                .or_else(|| types::parse_date(value).and_then(|date| date.and_hms_opt(0, 0, 0)))
                .map(|ts| Cell::TimestampMicros(ts.and_utc().timestamp_micros())),
            _ => Some(Cell::Utf8(value)),
        }
    }
}

/// Whether `extra` more bytes still fit the i32 offsets of a Utf8 array
fn fits_utf8(used: usize, extra: usize) -> bool {
    used.checked_add(extra).is_some_and(|total| total <= i32::MAX as usize)
}

enum ColumnBuilder {
    Int32(Int32Builder),
    Int64(Int64Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
    Date32(Date32Builder),
    Timestamp(TimestampMicrosecondBuilder),
    Utf8(StringBuilder),
}

impl ColumnBuilder {
    fn new(data_type: &DataType, capacity: usize) -> Result<Self, FrameError> {
        let builder = match data_type {
            DataType::Int32 => ColumnBuilder::Int32(Int32Builder::with_capacity(capacity)),
            DataType::Int64 => ColumnBuilder::Int64(Int64Builder::with_capacity(capacity)),
            DataType::Float64 => ColumnBuilder::Float64(Float64Builder::with_capacity(capacity)),
            DataType::Boolean => ColumnBuilder::Boolean(BooleanBuilder::with_capacity(capacity)),
            DataType::Date32 => ColumnBuilder::Date32(Date32Builder::with_capacity(capacity)),
            DataType::Timestamp(TimeUnit::Microsecond, None) => {
                ColumnBuilder::Timestamp(TimestampMicrosecondBuilder::with_capacity(capacity))
            }
            DataType::Utf8 => ColumnBuilder::Utf8(StringBuilder::new()),
            other => {
                return Err(FrameError::NotYetImplemented(format!(
                    "Reading csv values as {other}"
                )))
            }
        };
        Ok(builder)
    }

    fn append(&mut self, cell: Cell<'_>, name: &str) -> Result<(), FrameError> {
        match (self, cell) {
            (ColumnBuilder::Int32(b), Cell::Int32(v)) => b.append_value(v),
            (ColumnBuilder::Int64(b), Cell::Int64(v)) => b.append_value(v),
            (ColumnBuilder::Float64(b), Cell::Float64(v)) => b.append_value(v),
            (ColumnBuilder::Boolean(b), Cell::Boolean(v)) => b.append_value(v),
            (ColumnBuilder::Date32(b), Cell::Date32(v)) => b.append_value(v),
            (ColumnBuilder::Timestamp(b), Cell::TimestampMicros(v)) => b.append_value(v),
            (ColumnBuilder::Utf8(b), Cell::Utf8(v)) => {
                if !fits_utf8(b.values_slice().len(), v.len()) {
                    return Err(FrameError::InvalidArgument(format!(
                        "Column {name} holds more than {} bytes of text",
                        i32::MAX
                    )));
                }
                b.append_value(v)
            }
            (builder, _) => builder.append_null(),
        }
        Ok(())
    }

    fn append_null(&mut self) {
        match self {
            ColumnBuilder::Int32(b) => b.append_null(),
            ColumnBuilder::Int64(b) => b.append_null(),
            ColumnBuilder::Float64(b) => b.append_null(),
            ColumnBuilder::Boolean(b) => b.append_null(),
            ColumnBuilder::Date32(b) => b.append_null(),
            ColumnBuilder::Timestamp(b) => b.append_null(),
            ColumnBuilder::Utf8(b) => b.append_null(),
        }
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuilder::Int32(b) => Arc::new(b.finish()),
            ColumnBuilder::Int64(b) => Arc::new(b.finish()),
            ColumnBuilder::Float64(b) => Arc::new(b.finish()),
            ColumnBuilder::Boolean(b) => Arc::new(b.finish()),
            ColumnBuilder::Date32(b) => Arc::new(b.finish()),
            ColumnBuilder::Timestamp(b) => Arc::new(b.finish()),
            ColumnBuilder::Utf8(b) => Arc::new(b.finish()),
        }
    }
}
