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

//! Column functions supported by the local executor

use crate::column::Column;
use crate::expressions::Expr;

// Normal Functions

/// Returns a [Column] based on the given column name.
pub fn col(value: impl Into<Column>) -> Column {
    value.into()
}

/// Returns a [Column] based on the given column name.
pub fn column(value: impl Into<Column>) -> Column {
    value.into()
}

// Aggregate functions

/// Returns the number of non-null items in a group.
pub fn count(col: impl Into<Column>) -> Column {
    Column::from(Expr::Count(Box::new(col.into().expression)))
}

/// Returns the number of rows in a group.
pub fn count_all() -> Column {
    Column::from(Expr::CountStar)
}

// sort functions
/// Returns a sort expression based on the ascending order of the given column name.
pub fn asc(col: impl Into<Column>) -> Column {
    col.into().asc()
}

/// Returns a sort expression based on the ascending order of the given column name, and null values return before non-null values.
pub fn asc_nulls_first(col: impl Into<Column>) -> Column {
    col.into().asc_nulls_first()
}

/// Returns a sort expression based on the ascending order of the given column name, and null values appear after non-null values.
pub fn asc_nulls_last(col: impl Into<Column>) -> Column {
    col.into().asc_nulls_last()
}

/// Returns a sort expression based on the descending order of the given column name.
pub fn desc(col: impl Into<Column>) -> Column {
    col.into().desc()
}

/// Returns a sort expression based on the descending order of the given column name, and null values appear before non-null values.
pub fn desc_nulls_first(col: impl Into<Column>) -> Column {
    col.into().desc_nulls_first()
}

/// Returns a sort expression based on the descending order of the given column name, and null values appear after non-null values.
pub fn desc_nulls_last(col: impl Into<Column>) -> Column {
    col.into().desc_nulls_last()
}
