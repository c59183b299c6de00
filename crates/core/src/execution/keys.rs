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

//! Hashable row keys for joins and grouping

use arrow::array::{ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};

use crate::errors::FrameError;

/// A single non-null key value
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum KeyValue {
    Int(i64),
    /// Bits of a normalized `f64`
    Float(u64),
    Bool(bool),
    Str(String),
}

impl KeyValue {
    fn float(value: f64) -> KeyValue {
        // -0.0 equals 0.0 and every NaN equals every other NaN
        let value = if value == 0.0 {
            0.0
        } else if value.is_nan() {
            f64::NAN
        } else {
            value
        };
        KeyValue::Float(value.to_bits())
    }
}

fn is_string(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// Type two sides of an equality are compared as
pub(crate) fn common_type(left: &DataType, right: &DataType) -> DataType {
    if left == right {
        return left.clone();
    }

    match (left, right) {
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (l, r) if l.is_integer() && r.is_integer() => DataType::Int64,
        (l, r) if l.is_numeric() && r.is_numeric() => DataType::Float64,
        (s, n) | (n, s) if is_string(s) && n.is_integer() => DataType::Int64,
        (s, n) | (n, s) if is_string(s) && n.is_numeric() => DataType::Float64,
        (DataType::Date32, ts @ DataType::Timestamp(..))
        | (ts @ DataType::Timestamp(..), DataType::Date32) => ts.clone(),
        _ => DataType::Utf8,
    }
}

/// Casts both arrays to their [common_type]. Values that do not convert
/// become null.
pub(crate) fn coerce_pair(
    left: &ArrayRef,
    right: &ArrayRef,
) -> Result<(ArrayRef, ArrayRef), FrameError> {
    let target = common_type(left.data_type(), right.data_type());

    let coerce = |array: &ArrayRef| -> Result<ArrayRef, FrameError> {
        if array.data_type() == &target {
            Ok(array.clone())
        } else {
            Ok(cast(array, &target)?)
        }
    };

    Ok((coerce(left)?, coerce(right)?))
}

/// Key of every row of `array`, `None` where the value is null
pub(crate) fn key_values(array: &ArrayRef) -> Result<Vec<Option<KeyValue>>, FrameError> {
    let data_type = array.data_type();

    let keys = if data_type.is_integer()
        || matches!(
            data_type,
            DataType::Date32 | DataType::Date64 | DataType::Timestamp(..)
        ) {
        let ints = cast(array, &DataType::Int64)?;
        ints.as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map(KeyValue::Int))
            .collect()
    } else if data_type.is_numeric() {
        let floats = cast(array, &DataType::Float64)?;
        floats
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map(KeyValue::float))
            .collect()
    } else if let DataType::Boolean = data_type {
        array
            .as_boolean()
            .iter()
            .map(|v| v.map(KeyValue::Bool))
            .collect()
    } else {
        let strings = cast(array, &DataType::Utf8)?;
        strings
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(|s| KeyValue::Str(s.to_string())))
            .collect()
    };

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use arrow::array::{Float64Array, Int32Array, Int64Array, StringArray};
    use arrow::datatypes::TimeUnit;

    #[test]
    fn test_common_type() {
        use DataType::*;

        assert_eq!(Int64, common_type(&Int32, &Int64));
        assert_eq!(Float64, common_type(&Int32, &Float64));
        assert_eq!(Int64, common_type(&Utf8, &Int32));
        assert_eq!(Float64, common_type(&Float64, &Utf8));
        assert_eq!(Utf8, common_type(&Boolean, &Int32));
        assert_eq!(
            Timestamp(TimeUnit::Microsecond, None),
            common_type(&Date32, &Timestamp(TimeUnit::Microsecond, None))
        );
    }

    #[test]
    fn test_coerced_keys_match() -> Result<(), FrameError> {
        let ids: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let listing_ids: ArrayRef =
            Arc::new(StringArray::from(vec![Some("2"), Some("x"), None]));

        let (left, right) = coerce_pair(&ids, &listing_ids)?;
        let left = key_values(&left)?;
        let right = key_values(&right)?;

        assert_eq!(Some(KeyValue::Int(2)), left[1]);
        assert_eq!(left[1], right[0]);
        assert_eq!(None, right[1]);
        assert_eq!(None, right[2]);
        Ok(())
    }

    #[test]
    fn test_float_keys_normalized() -> Result<(), FrameError> {
        let values: ArrayRef = Arc::new(Float64Array::from(vec![0.0, -0.0, f64::NAN, -f64::NAN]));

        let keys = key_values(&values)?;
        assert_eq!(keys[0], keys[1]);
        assert_eq!(keys[2], keys[3]);

        let ints: ArrayRef = Arc::new(Int64Array::from(vec![7]));
        assert_eq!(Some(KeyValue::Int(7)), key_values(&ints)?[0]);
        Ok(())
    }
}
