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

//! Unresolved expressions and the traits used to create them
//!
//! - [ToExpr] accepts a `&str`, `String`, or [Column]. This trait uses the method `from`
//!   on the Column to create an expression.
//! - [ToVecExpr] many plan nodes require a `Vec<Expr>` this trait is a shorthand
//!   for that transformation

use std::fmt;

use crate::column::Column;

/// An unresolved expression. Column references are resolved against the
/// input of the plan node they are used in once an action is called.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A reference to a column by name, optionally bound to the plan id of the
    /// [DataFrame](crate::DataFrame) it was taken from.
    Column {
        name: String,
        plan_id: Option<i64>,
    },
    Alias {
        expr: Box<Expr>,
        name: String,
    },
    Eq(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    /// Number of non-null values
    Count(Box<Expr>),
    /// Number of rows
    CountStar,
    SortOrder {
        expr: Box<Expr>,
        ascending: bool,
        nulls_first: bool,
    },
}

impl Expr {
    /// Name of the output column produced by this expression.
    pub fn output_name(&self) -> String {
        match self {
            Expr::Column { name, .. } => name.clone(),
            Expr::Alias { name, .. } => name.clone(),
            Expr::SortOrder { expr, .. } => expr.output_name(),
            other => other.to_string(),
        }
    }

    /// Removes any alias wrapping the expression
    pub fn unalias(&self) -> &Expr {
        match self {
            Expr::Alias { expr, .. } => expr.unalias(),
            other => other,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.unalias(), Expr::Count(_) | Expr::CountStar)
    }

    /// Splits a conjunction into its terms
    pub(crate) fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(left, right) => {
                let mut terms = left.conjuncts();
                terms.extend(right.conjuncts());
                terms
            }
            other => vec![other],
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column { name, .. } => write!(f, "{name}"),
            Expr::Alias { expr, name } => write!(f, "{expr} AS {name}"),
            Expr::Eq(left, right) => write!(f, "({left} = {right})"),
            Expr::And(left, right) => write!(f, "({left} AND {right})"),
            Expr::Count(expr) => write!(f, "count({expr})"),
            Expr::CountStar => write!(f, "count(1)"),
            Expr::SortOrder {
                expr,
                ascending,
                nulls_first,
            } => write!(
                f,
                "{expr} {} NULLS {}",
                if *ascending { "ASC" } else { "DESC" },
                if *nulls_first { "FIRST" } else { "LAST" }
            ),
        }
    }
}

/// Translate string values into an `Expr`
pub trait ToExpr {
    fn to_expr(&self) -> Expr;
}

impl ToExpr for &str {
    fn to_expr(&self) -> Expr {
        Column::from(*self).expression.clone()
    }
}

impl ToExpr for String {
    fn to_expr(&self) -> Expr {
        Column::from(self.as_str()).expression.clone()
    }
}

impl ToExpr for Column {
    fn to_expr(&self) -> Expr {
        self.expression.clone()
    }
}

/// Translate values into a `Vec<Expr>`
pub trait ToVecExpr {
    fn to_vec_expr(&self) -> Vec<Expr>;
}

impl<T> ToVecExpr for T
where
    T: ToExpr,
{
    fn to_vec_expr(&self) -> Vec<Expr> {
        vec![self.to_expr()]
    }
}

impl ToVecExpr for Vec<Expr> {
    fn to_vec_expr(&self) -> Vec<Expr> {
        self.to_vec()
    }
}

impl<T> ToVecExpr for Vec<T>
where
    T: ToExpr,
{
    fn to_vec_expr(&self) -> Vec<Expr> {
        self.iter().map(|col| col.to_expr()).collect()
    }
}

impl<const N: usize, T> ToVecExpr for [T; N]
where
    T: ToExpr,
{
    fn to_vec_expr(&self) -> Vec<Expr> {
        self.iter().map(|col| col.to_expr()).collect()
    }
}
