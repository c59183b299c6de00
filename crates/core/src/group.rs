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

//! A DataFrame created with an aggregate statement

use crate::dataframe::DataFrame;
use crate::expressions::{Expr, ToVecExpr};
use crate::functions::count_all;
use crate::plan::LogicalPlanBuilder;

#[derive(Clone, Debug)]
pub struct GroupedData {
    df: DataFrame,
    grouping_cols: Vec<Expr>,
}

impl GroupedData {
    pub fn new(df: DataFrame, grouping_cols: Vec<Expr>) -> GroupedData {
        Self { df, grouping_cols }
    }

    /// Compute aggregates and returns the result as a [DataFrame]
    ///
    /// The output holds the grouping columns followed by one column per
    /// aggregate.
    pub fn agg<T: ToVecExpr>(self, exprs: T) -> DataFrame {
        let plan = LogicalPlanBuilder::aggregate(self.df.plan, self.grouping_cols, exprs);

        DataFrame {
            session: self.df.session,
            plan,
        }
    }

    /// Counts the number of records for each group.
    pub fn count(self) -> DataFrame {
        self.agg(count_all().alias("count"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::record_batch::RecordBatch;

    use crate::column::Column;
    use crate::errors::FrameError;
    use crate::functions::{col, count};
    use crate::{Session, SessionBuilder};

    async fn setup() -> Session {
        SessionBuilder::default()
            .app_name("rust_group")
            .build()
            .await
            .unwrap()
    }

    fn courses() -> RecordBatch {
        let course: ArrayRef = Arc::new(StringArray::from(vec![
            Some("dotNET"),
            Some("Java"),
            Some("dotNET"),
            Some("dotNET"),
            None,
        ]));
        let year: ArrayRef = Arc::new(Int64Array::from(vec![
            Some(2012),
            Some(2012),
            None,
            Some(2013),
            Some(2013),
        ]));

        RecordBatch::try_from_iter(vec![("course", course), ("year", year)]).unwrap()
    }

    #[tokio::test]
    async fn test_group_count() -> Result<(), FrameError> {
        let spark = setup().await;
        let df = spark.create_dataframe(&courses())?;

        let res = df.group_by::<Column>(None).count().collect().await?;

        let a: ArrayRef = Arc::new(Int64Array::from(vec![5]));
        let expected = RecordBatch::try_from_iter_with_nullable(vec![("count", a, false)])?;

        assert_eq!(expected, res);
        Ok(())
    }

    #[tokio::test]
    async fn test_group_agg() -> Result<(), FrameError> {
        let spark = setup().await;
        let df = spark.create_dataframe(&courses())?;

        let res = df
            .group_by(Some(col("course")))
            .agg([count(col("year")), count(col("course")).alias("n")])
            .collect()
            .await?;

        let course: ArrayRef = Arc::new(StringArray::from(vec![
            Some("dotNET"),
            Some("Java"),
            None,
        ]));
        let years: ArrayRef = Arc::new(Int64Array::from(vec![2, 1, 1]));
        let n: ArrayRef = Arc::new(Int64Array::from(vec![3, 1, 0]));

        let expected = RecordBatch::try_from_iter_with_nullable(vec![
            ("course", course, true),
            ("count(year)", years, false),
            ("n", n, false),
        ])?;

        assert_eq!(expected, res);
        Ok(())
    }
}
