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

//! Executes a [LogicalPlanBuilder] into a [RecordBatch]
//!
//! Every plan node evaluates to a [Frame]. Besides the data a frame records,
//! for each column, the ids of the plans that produced it. A column reference
//! bound to a plan id only resolves to columns carrying that id.

pub(crate) mod aggregate;
pub(crate) mod join;
pub(crate) mod keys;
pub(crate) mod sort;

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray};
use arrow::compute::kernels::{boolean, cmp};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use futures_util::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::datasource::reader;
use crate::errors::FrameError;
use crate::expressions::Expr;
use crate::plan::{LogicalPlanBuilder, Relation};

/// Intermediate result of a plan node
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub batch: RecordBatch,
    /// Plan ids that produced each column
    pub origins: Vec<Vec<i64>>,
}

/// A column computed from a [Frame]
#[derive(Clone, Debug)]
pub(crate) struct Evaluated {
    pub array: ArrayRef,
    pub field: Field,
    pub origins: Vec<i64>,
}

impl Frame {
    pub(crate) fn new(batch: RecordBatch, plan_id: i64) -> Frame {
        let origins = vec![vec![plan_id]; batch.num_columns()];
        Frame { batch, origins }
    }

    pub(crate) fn from_columns(
        columns: Vec<Evaluated>,
        num_rows: usize,
    ) -> Result<Frame, FrameError> {
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        let mut origins = Vec::with_capacity(columns.len());

        for column in columns {
            fields.push(column.field);
            arrays.push(column.array);
            origins.push(column.origins);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;

        Ok(Frame { batch, origins })
    }

    fn tag(mut self, plan_id: i64) -> Frame {
        for origin in &mut self.origins {
            origin.push(plan_id);
        }
        self
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Index of the single column matching `name`
    pub(crate) fn resolve(
        &self,
        name: &str,
        plan_id: Option<i64>,
        case_sensitive: bool,
    ) -> Result<usize, FrameError> {
        let schema = self.batch.schema();

        let matches: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(index, field)| {
                let same_name = if case_sensitive {
                    field.name() == name
                } else {
                    field.name().to_lowercase() == name.to_lowercase()
                };
                same_name && plan_id.map_or(true, |id| self.origins[*index].contains(&id))
            })
            .map(|(index, _)| index)
            .collect();

        match matches.as_slice() {
            [index] => Ok(*index),
            [] => {
                let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
                Err(FrameError::AnalysisException(format!(
                    "Cannot resolve column `{name}` among [{}]",
                    names.join(", ")
                )))
            }
            _ => Err(FrameError::AnalysisException(format!(
                "Reference `{name}` is ambiguous, found {} matching columns",
                matches.len()
            ))),
        }
    }

    /// Evaluates a row-wise expression against this frame
    pub(crate) fn evaluate(
        &self,
        expr: &Expr,
        case_sensitive: bool,
    ) -> Result<Evaluated, FrameError> {
        match expr {
            Expr::Column { name, plan_id } => {
                let index = self.resolve(name, *plan_id, case_sensitive)?;
                Ok(Evaluated {
                    array: self.batch.column(index).clone(),
                    field: self.batch.schema().field(index).clone(),
                    origins: self.origins[index].clone(),
                })
            }
            Expr::Alias { expr, name } => {
                let inner = self.evaluate(expr, case_sensitive)?;
                Ok(Evaluated {
                    array: inner.array,
                    field: inner.field.with_name(name),
                    origins: vec![],
                })
            }
            Expr::Eq(left, right) => {
                let left = self.evaluate(left, case_sensitive)?;
                let right = self.evaluate(right, case_sensitive)?;

                let (l, r) = keys::coerce_pair(&left.array, &right.array)?;
                let result = cmp::eq(&l, &r)?;

                Ok(Evaluated {
                    array: Arc::new(result),
                    field: Field::new(
                        expr.to_string(),
                        DataType::Boolean,
                        left.field.is_nullable() || right.field.is_nullable(),
                    ),
                    origins: vec![],
                })
            }
            Expr::And(left, right) => {
                let left = self.evaluate(left, case_sensitive)?;
                let right = self.evaluate(right, case_sensitive)?;

                let (Some(l), Some(r)) = (left.array.as_boolean_opt(), right.array.as_boolean_opt())
                else {
                    return Err(FrameError::AnalysisException(format!(
                        "AND requires boolean operands: {expr}"
                    )));
                };
                let result = boolean::and_kleene(l, r)?;

                Ok(Evaluated {
                    array: Arc::new(result),
                    field: Field::new(
                        expr.to_string(),
                        DataType::Boolean,
                        left.field.is_nullable() || right.field.is_nullable(),
                    ),
                    origins: vec![],
                })
            }
            Expr::Count(_) | Expr::CountStar => Err(FrameError::AnalysisException(format!(
                "Aggregate function {expr} is only allowed in an aggregation"
            ))),
            Expr::SortOrder { .. } => Err(FrameError::AnalysisException(format!(
                "Sort order {expr} is only allowed in a sort"
            ))),
        }
    }
}

/// Evaluates plans bottom up, holding every intermediate result in memory
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Executor {
    case_sensitive: bool,
}

impl Executor {
    pub(crate) fn new(case_sensitive: bool) -> Executor {
        Executor { case_sensitive }
    }

    pub(crate) async fn collect(
        &self,
        plan: &LogicalPlanBuilder,
    ) -> Result<RecordBatch, FrameError> {
        Ok(self.execute(plan).await?.batch)
    }

    fn execute<'a>(
        &'a self,
        plan: &'a LogicalPlanBuilder,
    ) -> BoxFuture<'a, Result<Frame, FrameError>> {
        async move {
            let plan_id = plan.plan_id();

            let frame = match plan.relation() {
                Relation::Read {
                    format,
                    paths,
                    schema,
                    options,
                } => {
                    if !format.eq_ignore_ascii_case("csv") {
                        return Err(FrameError::InvalidArgument(format!(
                            "Unsupported data source format: {format}"
                        )));
                    }
                    let batch = reader::read_csv(paths, schema.clone(), options).await?;
                    Frame::new(batch, plan_id)
                }
                Relation::LocalRelation { data } => Frame::new(data.clone(), plan_id),
                Relation::Project { input, expressions } => {
                    let input = self.execute(input).await?;
                    let columns = expressions
                        .iter()
                        .map(|expr| input.evaluate(expr, self.case_sensitive))
                        .collect::<Result<Vec<_>, _>>()?;
                    Frame::from_columns(columns, input.num_rows())?.tag(plan_id)
                }
                Relation::Join {
                    left,
                    right,
                    join_condition,
                    join_type,
                } => {
                    let left = self.execute(left).await?;
                    let right = self.execute(right).await?;
                    join::join(
                        &left,
                        &right,
                        join_condition.as_ref(),
                        *join_type,
                        self.case_sensitive,
                    )?
                    .tag(plan_id)
                }
                Relation::Aggregate {
                    input,
                    grouping_expressions,
                    aggregate_expressions,
                } => {
                    let input = self.execute(input).await?;
                    aggregate::aggregate(
                        &input,
                        grouping_expressions,
                        aggregate_expressions,
                        self.case_sensitive,
                    )?
                    .tag(plan_id)
                }
                Relation::Sort { input, order } => {
                    let input = self.execute(input).await?;
                    sort::sort(&input, order, self.case_sensitive)?.tag(plan_id)
                }
                Relation::Limit { input, limit } => {
                    let input = self.execute(input).await?;
                    let len = (*limit).min(input.num_rows());
                    Frame {
                        batch: input.batch.slice(0, len),
                        origins: input.origins,
                    }
                    .tag(plan_id)
                }
            };

            debug!(
                plan_id,
                node = plan.relation().name(),
                rows = frame.num_rows(),
                columns = frame.batch.num_columns(),
                "executed plan node"
            );

            Ok(frame)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arrow::array::{BooleanArray, Int64Array, StringArray};

    use crate::column::Column;
    use crate::functions::{col, count};

    fn frame() -> Frame {
        let id: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
        let name: ArrayRef = Arc::new(StringArray::from(vec!["a", "b", "c"]));
        let batch = RecordBatch::try_from_iter(vec![("id", id), ("Name", name)]).unwrap();
        Frame::new(batch, 7)
    }

    #[test]
    fn test_resolve_case_insensitive() -> Result<(), FrameError> {
        let frame = frame();

        assert_eq!(1, frame.resolve("name", None, false)?);
        assert!(frame.resolve("name", None, true).is_err());
        assert_eq!(1, frame.resolve("Name", None, true)?);
        Ok(())
    }

    #[test]
    fn test_resolve_bound_columns() -> Result<(), FrameError> {
        let frame = frame();

        assert_eq!(0, frame.resolve("id", Some(7), false)?);
        assert!(matches!(
            frame.resolve("id", Some(8), false),
            Err(FrameError::AnalysisException(_))
        ));
        Ok(())
    }

    #[test]
    fn test_resolve_ambiguous() {
        let left = frame();
        let right = Frame::new(left.batch.clone(), 9);
        let columns = vec![
            left.evaluate(&col("id").expression, false).unwrap(),
            right.evaluate(&col("id").expression, false).unwrap(),
        ];
        let joined = Frame::from_columns(columns, 3).unwrap();

        let err = joined.resolve("id", None, false).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
        assert_eq!(1, joined.resolve("id", Some(9), false).unwrap());
    }

    #[test]
    fn test_evaluate_expressions() -> Result<(), FrameError> {
        let frame = frame();

        let renamed = frame.evaluate(&col("id").alias("listing_id").expression, false)?;
        assert_eq!("listing_id", renamed.field.name());

        let equal = frame.evaluate(&col("id").eq(Column::from("id")).expression, false)?;
        let expected = BooleanArray::from(vec![true, true, true]);
        assert_eq!(&expected, equal.array.as_boolean());

        assert!(frame
            .evaluate(&count(col("id")).expression, false)
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_project_and_limit() -> Result<(), FrameError> {
        let plan = LogicalPlanBuilder::local_relation(&frame().batch)
            .select([col("name")])
            .limit(2);

        let batch = Executor::new(false).collect(&plan).await?;

        assert_eq!(2, batch.num_rows());
        assert_eq!(1, batch.num_columns());
        assert_eq!("Name", batch.schema().field(0).name());
        Ok(())
    }
}
