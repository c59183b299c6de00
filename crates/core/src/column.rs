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

//! [Column] represents a column in a DataFrame that holds an [Expr]
use std::convert::From;

use crate::expressions::{Expr, ToExpr};

/// # Column
///
/// A column holds a specific [Expr] which will be resolved once an action is called.
///
/// A column created from a `&str` or with `col("name")` matches any column with that
/// name. A column taken from a DataFrame with `df.col("name")` only matches columns
/// produced by that DataFrame, which keeps both sides of a join addressable.
///
/// ```rust
/// // As a &str representing an unresolved column in the dataframe
/// df.select("id");
///
/// // By using the `col` function
/// df.select(col("id"));
///
/// // Bound to the dataframe it comes from
/// listings.join(reviews.clone(), Some(listings.col("id").eq(reviews.col("listing_id"))), JoinType::Inner);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// an [Expr] containing any unresolved value to be leveraged in a plan
    pub expression: Expr,
}

impl From<Expr> for Column {
    /// Used for creating columns from an [Expr]
    fn from(expression: Expr) -> Self {
        Self { expression }
    }
}

impl From<&str> for Column {
    fn from(value: &str) -> Self {
        Column::from(Expr::Column {
            name: value.to_string(),
            plan_id: None,
        })
    }
}

impl From<String> for Column {
    fn from(value: String) -> Self {
        Column::from(value.as_str())
    }
}

impl Column {
    pub(crate) fn bound(name: &str, plan_id: i64) -> Column {
        Column::from(Expr::Column {
            name: name.to_string(),
            plan_id: Some(plan_id),
        })
    }

    /// Returns the column with a new name
    ///
    /// # Example:
    /// ```rust
    /// let cols = [
    ///     col("name").alias("new_name"),
    ///     col("age").alias("new_age")
    /// ];
    ///
    /// df.select(cols);
    /// ```
    pub fn alias(self, value: &str) -> Column {
        Column::from(Expr::Alias {
            expr: Box::new(self.expression),
            name: value.to_string(),
        })
    }

    /// An alias for the function `alias`
    pub fn name(self, value: &str) -> Column {
        self.alias(value)
    }

    /// Returns a sorted expression based on the ascending order of the column
    ///
    /// # Example:
    /// ```rust
    /// let df: DataFrame = df.sort([col("id").asc()]);
    ///
    /// let df: DataFrame = df.sort([asc(col("id"))]);
    /// ```
    pub fn asc(self) -> Column {
        self.asc_nulls_first()
    }

    pub fn asc_nulls_first(self) -> Column {
        self.sort_order(true, true)
    }

    pub fn asc_nulls_last(self) -> Column {
        self.sort_order(true, false)
    }

    /// Returns a sorted expression based on the descending order of the column
    ///
    /// # Example:
    /// ```rust
    /// let df: DataFrame = df.sort([col("id").desc()]);
    ///
    /// let df: DataFrame = df.sort([desc(col("id"))]);
    /// ```
    pub fn desc(self) -> Column {
        self.desc_nulls_last()
    }

    pub fn desc_nulls_first(self) -> Column {
        self.sort_order(false, true)
    }

    pub fn desc_nulls_last(self) -> Column {
        self.sort_order(false, false)
    }

    fn sort_order(self, ascending: bool, nulls_first: bool) -> Column {
        // re-ordering an already ordered column replaces the direction
        let expr = match self.expression {
            Expr::SortOrder { expr, .. } => expr,
            other => Box::new(other),
        };

        Column::from(Expr::SortOrder {
            expr,
            ascending,
            nulls_first,
        })
    }

    /// Equality comparion. Cannot overload the '==' and return something other
    /// than a bool
    pub fn eq<T: ToExpr>(self, other: T) -> Column {
        Column::from(Expr::Eq(
            Box::new(self.expression),
            Box::new(other.to_expr()),
        ))
    }

    /// Logical AND comparion. Cannot overload the '&&' and return something other
    /// than a bool
    pub fn and<T: ToExpr>(self, other: T) -> Column {
        Column::from(Expr::And(
            Box::new(self.expression),
            Box::new(other.to_expr()),
        ))
    }
}
