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

//! Logical Plan representation

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::expressions::{Expr, ToExpr, ToVecExpr};

static NEXT_PLAN_ID: AtomicI64 = AtomicI64::new(1);

/// How rows of two relations are combined
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinType {
    /// Rows with a match on both sides
    #[default]
    Inner,
    /// Every left row, with nulls on the right when nothing matches
    LeftOuter,
    /// Left rows with at least one match, left columns only
    LeftSemi,
    /// Left rows without any match, left columns only
    LeftAnti,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "Inner",
            JoinType::LeftOuter => "LeftOuter",
            JoinType::LeftSemi => "LeftSemi",
            JoinType::LeftAnti => "LeftAnti",
        };
        write!(f, "{name}")
    }
}

/// A node of an unresolved logical plan
#[derive(Clone, Debug)]
pub enum Relation {
    Read {
        format: String,
        paths: Vec<String>,
        schema: Option<SchemaRef>,
        options: HashMap<String, String>,
    },
    LocalRelation {
        data: RecordBatch,
    },
    Project {
        input: Box<LogicalPlanBuilder>,
        expressions: Vec<Expr>,
    },
    Join {
        left: Box<LogicalPlanBuilder>,
        right: Box<LogicalPlanBuilder>,
        join_condition: Option<Expr>,
        join_type: JoinType,
    },
    Aggregate {
        input: Box<LogicalPlanBuilder>,
        grouping_expressions: Vec<Expr>,
        aggregate_expressions: Vec<Expr>,
    },
    Sort {
        input: Box<LogicalPlanBuilder>,
        order: Vec<Expr>,
    },
    Limit {
        input: Box<LogicalPlanBuilder>,
        limit: usize,
    },
}

impl Relation {
    pub fn name(&self) -> &'static str {
        match self {
            Relation::Read { .. } => "Read",
            Relation::LocalRelation { .. } => "LocalRelation",
            Relation::Project { .. } => "Project",
            Relation::Join { .. } => "Join",
            Relation::Aggregate { .. } => "Aggregate",
            Relation::Sort { .. } => "Sort",
            Relation::Limit { .. } => "Limit",
        }
    }
}

/// Implements a struct to hold the current [Relation]
/// which represents an unresolved Logical Plan
#[derive(Clone, Debug)]
pub struct LogicalPlanBuilder {
    relation: Relation,
    plan_id: i64,
}

impl LogicalPlanBuilder {
    fn next_plan_id() -> i64 {
        NEXT_PLAN_ID.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a new Logical Plan from an initial [Relation]
    pub fn new(relation: Relation) -> LogicalPlanBuilder {
        LogicalPlanBuilder {
            relation,
            plan_id: LogicalPlanBuilder::next_plan_id(),
        }
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn plan_id(&self) -> i64 {
        self.plan_id
    }

    fn relation_input(self) -> Box<LogicalPlanBuilder> {
        Box::new(self)
    }

    pub fn local_relation(data: &RecordBatch) -> LogicalPlanBuilder {
        LogicalPlanBuilder::new(Relation::LocalRelation { data: data.clone() })
    }

    pub fn select<T: ToVecExpr>(self, cols: T) -> LogicalPlanBuilder {
        LogicalPlanBuilder::new(Relation::Project {
            input: self.relation_input(),
            expressions: cols.to_vec_expr(),
        })
    }

    pub fn join<T: ToExpr>(
        self,
        right: LogicalPlanBuilder,
        join_condition: Option<T>,
        join_type: JoinType,
    ) -> LogicalPlanBuilder {
        LogicalPlanBuilder::new(Relation::Join {
            left: self.relation_input(),
            right: right.relation_input(),
            join_condition: join_condition.map(|cond| cond.to_expr()),
            join_type,
        })
    }

    pub fn aggregate<T: ToVecExpr>(
        input: LogicalPlanBuilder,
        grouping_cols: Vec<Expr>,
        agg_expression: T,
    ) -> LogicalPlanBuilder {
        LogicalPlanBuilder::new(Relation::Aggregate {
            input: input.relation_input(),
            grouping_expressions: grouping_cols,
            aggregate_expressions: agg_expression.to_vec_expr(),
        })
    }

    pub fn sort<I, T>(self, cols: I) -> LogicalPlanBuilder
    where
        T: ToExpr,
        I: IntoIterator<Item = T>,
    {
        let order = cols
            .into_iter()
            .map(|col| match col.to_expr() {
                sort @ Expr::SortOrder { .. } => sort,
                // unordered columns sort ascending
                other => Expr::SortOrder {
                    expr: Box::new(other),
                    ascending: true,
                    nulls_first: true,
                },
            })
            .collect();

        LogicalPlanBuilder::new(Relation::Sort {
            input: self.relation_input(),
            order,
        })
    }

    pub fn limit(self, limit: usize) -> LogicalPlanBuilder {
        LogicalPlanBuilder::new(Relation::Limit {
            input: self.relation_input(),
            limit,
        })
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let id = self.plan_id;

        let children: Vec<&LogicalPlanBuilder> = match &self.relation {
            Relation::Read {
                format,
                paths,
                schema,
                ..
            } => {
                let schema = if schema.is_some() { "user" } else { "inferred" };
                writeln!(f, "{indent}Read #{id} {format} {paths:?} schema={schema}")?;
                vec![]
            }
            Relation::LocalRelation { data } => {
                writeln!(f, "{indent}LocalRelation #{id} rows={}", data.num_rows())?;
                vec![]
            }
            Relation::Project { input, expressions } => {
                writeln!(f, "{indent}Project #{id} {}", join_exprs(expressions))?;
                vec![&**input]
            }
            Relation::Join {
                left,
                right,
                join_condition,
                join_type,
            } => {
                match join_condition {
                    Some(cond) => writeln!(f, "{indent}Join #{id} {join_type} {cond}")?,
                    None => writeln!(f, "{indent}Join #{id} {join_type}")?,
                }
                vec![&**left, &**right]
            }
            Relation::Aggregate {
                input,
                grouping_expressions,
                aggregate_expressions,
            } => {
                writeln!(
                    f,
                    "{indent}Aggregate #{id} [{}] [{}]",
                    join_exprs(grouping_expressions),
                    join_exprs(aggregate_expressions)
                )?;
                vec![&**input]
            }
            Relation::Sort { input, order } => {
                writeln!(f, "{indent}Sort #{id} {}", join_exprs(order))?;
                vec![&**input]
            }
            Relation::Limit { input, limit } => {
                writeln!(f, "{indent}Limit #{id} {limit}")?;
                vec![&**input]
            }
        };

        for child in children {
            child.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

fn join_exprs(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|expr| expr.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Indented tree of the plan, children below their parent
impl fmt::Display for LogicalPlanBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array};

    use super::*;
    use crate::functions::col;

    fn local() -> LogicalPlanBuilder {
        let id: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
        let batch = RecordBatch::try_from_iter(vec![("id", id)]).unwrap();
        LogicalPlanBuilder::local_relation(&batch)
    }

    #[test]
    fn test_plan_ids_increase() {
        let base = local();
        let base_id = base.plan_id();

        let limited = base.limit(1);
        assert!(limited.plan_id() > base_id);
    }

    #[test]
    fn test_sort_wraps_plain_columns() {
        let plan = local().sort([col("id")]);

        match plan.relation() {
            Relation::Sort { order, .. } => {
                assert_eq!("id ASC NULLS FIRST", order[0].to_string());
            }
            other => panic!("unexpected relation {other:?}"),
        }
    }

    #[test]
    fn test_tree_string() {
        let plan = local().select(["id"]).limit(5);

        let tree = plan.to_string();
        let lines: Vec<&str> = tree.lines().collect();

        assert_eq!(3, lines.len());
        assert!(lines[0].starts_with("Limit"));
        assert!(lines[1].starts_with("  Project"));
        assert!(lines[2].starts_with("    LocalRelation"));
    }
}
