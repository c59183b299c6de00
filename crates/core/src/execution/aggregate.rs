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

//! Hash aggregation
//!
//! Groups appear in the order their first row appears in the input. A null
//! grouping value forms a group of its own.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, Int64Array, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field};

use super::keys::{self, KeyValue};
use super::{Evaluated, Frame};
use crate::errors::FrameError;
use crate::expressions::Expr;

pub(crate) fn aggregate(
    input: &Frame,
    grouping: &[Expr],
    aggregates: &[Expr],
    case_sensitive: bool,
) -> Result<Frame, FrameError> {
    let num_rows = input.num_rows();

    let group_columns = grouping
        .iter()
        .map(|expr| input.evaluate(expr, case_sensitive))
        .collect::<Result<Vec<_>, _>>()?;

    let key_columns = group_columns
        .iter()
        .map(|column| keys::key_values(&column.array))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: HashMap<Vec<Option<KeyValue>>, usize> = HashMap::new();
    let mut first_rows: Vec<u32> = Vec::new();
    let mut group_of_row: Vec<usize> = Vec::with_capacity(num_rows);

    for row in 0..num_rows {
        let key: Vec<Option<KeyValue>> = key_columns
            .iter()
            .map(|column| column[row].clone())
            .collect();

        let next = first_rows.len();
        let group = *groups.entry(key).or_insert_with(|| {
            first_rows.push(row as u32);
            next
        });
        group_of_row.push(group);
    }

    // a global aggregate always produces exactly one row
    let num_groups = if grouping.is_empty() {
        1
    } else {
        first_rows.len()
    };

    let first_rows = UInt32Array::from(first_rows);

    let mut columns = Vec::with_capacity(grouping.len() + aggregates.len());
    for column in group_columns {
        columns.push(Evaluated {
            array: take(&column.array, &first_rows, None)?,
            ..column
        });
    }

    for expr in aggregates {
        let counts = match expr.unalias() {
            Expr::CountStar => {
                let mut counts = vec![0i64; num_groups];
                for group in &group_of_row {
                    counts[*group] += 1;
                }
                counts
            }
            Expr::Count(inner) => {
                let values = input.evaluate(inner, case_sensitive)?.array;
                let mut counts = vec![0i64; num_groups];
                for (row, group) in group_of_row.iter().enumerate() {
                    if values.is_valid(row) {
                        counts[*group] += 1;
                    }
                }
                counts
            }
            _ => {
                return Err(FrameError::AnalysisException(format!(
                    "Expression {expr} is not an aggregate function"
                )))
            }
        };

        columns.push(Evaluated {
            array: Arc::new(Int64Array::from(counts)),
            field: Field::new(expr.output_name(), DataType::Int64, false),
            origins: vec![],
        });
    }

    Frame::from_columns(columns, num_groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    use arrow::array::{ArrayRef, AsArray, StringArray};
    use arrow::datatypes::Int64Type;
    use arrow::record_batch::RecordBatch;

    use crate::functions::{col, count, count_all};

    fn joined() -> Frame {
        let id: ArrayRef = Arc::new(Int64Array::from(vec![Some(2), Some(1), Some(2), None]));
        let name: ArrayRef = Arc::new(StringArray::from(vec!["Studio", "Loft", "Studio", "Ghost"]));
        let review: ArrayRef =
            Arc::new(Int64Array::from(vec![Some(101), Some(102), None, Some(104)]));
        let batch =
            RecordBatch::try_from_iter(vec![("id", id), ("name", name), ("review_id", review)])
                .unwrap();
        Frame::new(batch, 1)
    }

    fn counts(frame: &Frame, index: usize) -> Vec<i64> {
        frame
            .batch
            .column(index)
            .as_primitive::<Int64Type>()
            .values()
            .to_vec()
    }

    #[test]
    fn test_group_counts() -> Result<(), FrameError> {
        let grouping = vec![col("id").expression, col("name").expression];
        let aggregates = vec![
            count(col("review_id")).alias("num_reviews").expression,
            count_all().expression,
        ];

        let frame = aggregate(&joined(), &grouping, &aggregates, false)?;

        let schema = frame.batch.schema();
        assert_eq!("num_reviews", schema.field(2).name());
        assert_eq!("count(1)", schema.field(3).name());
        assert!(!schema.field(2).is_nullable());

        // first appearance order, null key is its own group
        let ids: Vec<Option<i64>> = frame
            .batch
            .column(0)
            .as_primitive::<Int64Type>()
            .iter()
            .collect();
        assert_eq!(vec![Some(2), Some(1), None], ids);
        assert_eq!(vec![1, 1, 1], counts(&frame, 2));
        assert_eq!(vec![2, 1, 1], counts(&frame, 3));
        Ok(())
    }

    #[test]
    fn test_global_aggregate_on_empty_input() -> Result<(), FrameError> {
        let empty = Frame {
            batch: joined().batch.slice(0, 0),
            origins: joined().origins,
        };

        let frame = aggregate(&empty, &[], &[count(col("id")).expression], false)?;

        assert_eq!(1, frame.num_rows());
        assert_eq!("count(id)", frame.batch.schema().field(0).name());
        assert_eq!(vec![0], counts(&frame, 0));
        Ok(())
    }

    #[test]
    fn test_non_aggregate_rejected() {
        let res = aggregate(&joined(), &[], &[col("name").expression], false);
        assert!(matches!(res, Err(FrameError::AnalysisException(_))));
    }
}
