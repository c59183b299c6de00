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

//! Stable multi-key sort

use std::sync::Arc;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::{lexsort_to_indices, take_record_batch, SortColumn, SortOptions};

use super::Frame;
use crate::errors::FrameError;
use crate::expressions::Expr;

pub(crate) fn sort(
    input: &Frame,
    order: &[Expr],
    case_sensitive: bool,
) -> Result<Frame, FrameError> {
    if order.is_empty() || input.batch.num_columns() == 0 {
        return Ok(input.clone());
    }

    let mut columns = Vec::with_capacity(order.len() + 1);

    for expr in order {
        let (expr, ascending, nulls_first) = match expr {
            Expr::SortOrder {
                expr,
                ascending,
                nulls_first,
            } => (expr.as_ref(), *ascending, *nulls_first),
            other => (other, true, true),
        };

        let values = input.evaluate(expr, case_sensitive)?.array;
        columns.push(SortColumn {
            values,
            options: Some(SortOptions {
                descending: !ascending,
                nulls_first,
            }),
        });
    }

    // input position breaks ties
    let positions: ArrayRef = Arc::new(UInt32Array::from_iter_values(
        0..input.num_rows() as u32,
    ));
    columns.push(SortColumn {
        values: positions,
        options: None,
    });

    let indices = lexsort_to_indices(&columns, None)?;
    let batch = take_record_batch(&input.batch, &indices)?;

    Ok(Frame {
        batch,
        origins: input.origins.clone(),
    })
}
