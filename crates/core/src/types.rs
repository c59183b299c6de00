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

//! Text values to Arrow types
//!
//! Schema inference classifies every non-null field of a column and widens
//! the column type to the least upper bound of what it has seen.

use arrow::datatypes::{DataType, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Type inferred for a column of text values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InferredType {
    /// Nothing but nulls seen so far
    Null,
    Integer,
    Long,
    Double,
    Boolean,
    Date,
    Timestamp,
    String,
}

impl InferredType {
    /// Classifies a single non-null value
    pub fn of(value: &str) -> InferredType {
        if value.parse::<i32>().is_ok() {
            InferredType::Integer
        } else if value.parse::<i64>().is_ok() {
            InferredType::Long
        } else if is_double(value) {
            InferredType::Double
        } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            InferredType::Boolean
        } else if parse_date(value).is_some() {
            InferredType::Date
        } else if parse_timestamp(value).is_some() {
            InferredType::Timestamp
        } else {
            InferredType::String
        }
    }

    /// Least upper bound of two inferred types
    pub fn merge(self, other: InferredType) -> InferredType {
        use InferredType::*;

        match (self, other) {
            (a, b) if a == b => a,
            (Null, t) | (t, Null) => t,
            (Integer, Long) | (Long, Integer) => Long,
            (Integer | Long, Double) | (Double, Integer | Long) => Double,
            (Date, Timestamp) | (Timestamp, Date) => Timestamp,
            _ => String,
        }
    }

    /// Arrow type used to hold a column of this type
    pub fn data_type(self) -> DataType {
        match self {
            InferredType::Integer => DataType::Int32,
            InferredType::Long => DataType::Int64,
            InferredType::Double => DataType::Float64,
            InferredType::Boolean => DataType::Boolean,
            InferredType::Date => DataType::Date32,
            InferredType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            InferredType::Null | InferredType::String => DataType::Utf8,
        }
    }
}

// `f64::from_str` also accepts words such as "inf" or "nan"
fn is_double(value: &str) -> bool {
    value.bytes().any(|b| b.is_ascii_digit()) && value.parse::<f64>().is_ok()
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Whether values of `data_type` can be produced from text
pub(crate) fn is_supported(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int32
            | DataType::Int64
            | DataType::Float64
            | DataType::Boolean
            | DataType::Date32
            | DataType::Timestamp(TimeUnit::Microsecond, None)
            | DataType::Utf8
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_values() {
        assert_eq!(InferredType::Integer, InferredType::of("42"));
        assert_eq!(InferredType::Integer, InferredType::of("-7"));
        assert_eq!(InferredType::Long, InferredType::of("53645372981"));
        assert_eq!(InferredType::Double, InferredType::of("4.85"));
        assert_eq!(InferredType::Boolean, InferredType::of("TRUE"));
        assert_eq!(InferredType::Date, InferredType::of("2019-05-21"));
        assert_eq!(InferredType::Timestamp, InferredType::of("2019-05-21 10:11:12"));
        assert_eq!(InferredType::Timestamp, InferredType::of("2019-05-21T10:11:12.500"));
        assert_eq!(InferredType::String, InferredType::of("Cozy Loft"));
        assert_eq!(InferredType::String, InferredType::of("nan"));
        assert_eq!(InferredType::String, InferredType::of("inf"));
    }

    #[test]
    fn test_merge_types() {
        use InferredType::*;

        assert_eq!(Integer, Null.merge(Integer));
        assert_eq!(Long, Integer.merge(Long));
        assert_eq!(Double, Long.merge(Double));
        assert_eq!(Timestamp, Date.merge(Timestamp));
        assert_eq!(String, Integer.merge(Boolean));
        assert_eq!(String, Date.merge(Double));
        assert_eq!(String, String.merge(Null));
    }

    #[test]
    fn test_all_null_column_is_string() {
        assert_eq!(DataType::Utf8, InferredType::Null.data_type());
    }
}
