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

//! Hash equi-join
//!
//! The right side is indexed by key, then left rows probe the index in
//! order. Output rows follow the left input, matches for one left row follow
//! the right input. Rows with a null in any key never match.

use std::collections::HashMap;

use arrow::array::UInt32Array;
use arrow::compute::take;

use super::keys::{self, KeyValue};
use super::{Evaluated, Frame};
use crate::errors::FrameError;
use crate::expressions::Expr;
use crate::plan::JoinType;

/// Column indices compared by one equality term
struct KeyPair {
    left: usize,
    right: usize,
}

pub(crate) fn join(
    left: &Frame,
    right: &Frame,
    condition: Option<&Expr>,
    join_type: JoinType,
    case_sensitive: bool,
) -> Result<Frame, FrameError> {
    let pairs = match condition {
        Some(condition) => key_pairs(left, right, condition, case_sensitive)?,
        // no condition pairs every row with every row
        None => vec![],
    };

    let (left_keys, right_keys) = row_keys(left, right, &pairs)?;

    let mut index: HashMap<&[KeyValue], Vec<u32>> = HashMap::new();
    for (row, key) in right_keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key.as_slice()).or_default().push(row as u32);
        }
    }

    let mut left_rows: Vec<u32> = Vec::new();
    let mut right_rows: Vec<Option<u32>> = Vec::new();

    for (row, key) in left_keys.iter().enumerate() {
        let matches = key
            .as_ref()
            .and_then(|key| index.get(key.as_slice()))
            .map_or(&[][..], Vec::as_slice);

        match join_type {
            JoinType::Inner => {
                for m in matches {
                    left_rows.push(row as u32);
                    right_rows.push(Some(*m));
                }
            }
            JoinType::LeftOuter => {
                if matches.is_empty() {
                    left_rows.push(row as u32);
                    right_rows.push(None);
                }
                for m in matches {
                    left_rows.push(row as u32);
                    right_rows.push(Some(*m));
                }
            }
            JoinType::LeftSemi => {
                if !matches.is_empty() {
                    left_rows.push(row as u32);
                }
            }
            JoinType::LeftAnti => {
                if matches.is_empty() {
                    left_rows.push(row as u32);
                }
            }
        }
    }

    let num_rows = left_rows.len();
    let left_indices = UInt32Array::from(left_rows);

    let mut columns = gather(left, &left_indices, false)?;

    if matches!(join_type, JoinType::Inner | JoinType::LeftOuter) {
        let right_indices = UInt32Array::from(right_rows);
        columns.extend(gather(right, &right_indices, join_type == JoinType::LeftOuter)?);
    }

    Frame::from_columns(columns, num_rows)
}

fn gather(
    frame: &Frame,
    indices: &UInt32Array,
    nullable: bool,
) -> Result<Vec<Evaluated>, FrameError> {
    let schema = frame.batch.schema();

    frame
        .batch
        .columns()
        .iter()
        .zip(schema.fields())
        .zip(&frame.origins)
        .map(|((array, field), origins)| {
            let field = (**field).clone();
            let nullable = nullable || field.is_nullable();
            Ok(Evaluated {
                array: take(array, indices, None)?,
                field: field.with_nullable(nullable),
                origins: origins.clone(),
            })
        })
        .collect()
}

/// Splits the condition into equalities between a left and a right column
fn key_pairs(
    left: &Frame,
    right: &Frame,
    condition: &Expr,
    case_sensitive: bool,
) -> Result<Vec<KeyPair>, FrameError> {
    condition
        .conjuncts()
        .into_iter()
        .map(|term| {
            let Expr::Eq(a, b) = term else {
                return Err(FrameError::NotYetImplemented(format!(
                    "Only equality join conditions are supported, found {term}"
                )));
            };

            let resolve = |frame: &Frame, expr: &Expr| match expr.unalias() {
                Expr::Column { name, plan_id } => frame.resolve(name, *plan_id, case_sensitive),
                other => Err(FrameError::NotYetImplemented(format!(
                    "Join keys must be columns, found {other}"
                ))),
            };

            match (resolve(left, a), resolve(right, b)) {
                (Ok(left), Ok(right)) => Ok(KeyPair { left, right }),
                (first, _) => match (resolve(left, b), resolve(right, a)) {
                    (Ok(left), Ok(right)) => Ok(KeyPair { left, right }),
                    _ => Err(first.err().unwrap_or_else(|| {
                        FrameError::AnalysisException(format!(
                            "Cannot resolve join condition {term}"
                        ))
                    })),
                },
            }
        })
        .collect()
}

type RowKeys = Vec<Option<Vec<KeyValue>>>;

/// Key of every row on both sides, `None` when a key value is null
fn row_keys(
    left: &Frame,
    right: &Frame,
    pairs: &[KeyPair],
) -> Result<(RowKeys, RowKeys), FrameError> {
    let mut left_columns = Vec::with_capacity(pairs.len());
    let mut right_columns = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let (l, r) = keys::coerce_pair(
            left.batch.column(pair.left),
            right.batch.column(pair.right),
        )?;
        left_columns.push(keys::key_values(&l)?);
        right_columns.push(keys::key_values(&r)?);
    }

    let collect = |columns: &[Vec<Option<KeyValue>>], num_rows: usize| -> RowKeys {
        (0..num_rows)
            .map(|row| columns.iter().map(|column| column[row].clone()).collect())
            .collect()
    };

    Ok((
        collect(&left_columns, left.num_rows()),
        collect(&right_columns, right.num_rows()),
    ))
}
