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

//! DataFrame representation

use arrow::array::AsArray;
use arrow::datatypes::{Int64Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty;

use crate::column::Column;
use crate::errors::FrameError;
use crate::expressions::{ToExpr, ToVecExpr};
use crate::functions::count_all;
use crate::group::GroupedData;
use crate::plan::LogicalPlanBuilder;
use crate::session::Session;

pub use crate::plan::JoinType;
pub use crate::readwriter::{DataFrameReader, DataFrameWriter, SaveMode};

#[cfg(feature = "datafusion")]
use datafusion::execution::context::SessionContext;

/// DataFrame is composed of a [Session] and a [LogicalPlanBuilder] which
/// represents the unresolved plan executed when an action is called.
///
/// Every transformation takes the prior plan and builds onto it. Nothing is
/// read or computed until an action such as [DataFrame::collect],
/// [DataFrame::count] or [DataFrameWriter::save] runs.
///
/// ## create_dataframe
///
/// ```rust
/// let name: ArrayRef = Arc::new(StringArray::from(vec!["Tom", "Alice", "Bob"]));
/// let age: ArrayRef = Arc::new(Int64Array::from(vec![14, 23, 16]));
///
/// let data = RecordBatch::try_from_iter(vec![("name", name), ("age", age)])?;
///
/// let df = spark.create_dataframe(&data)?;
/// ```
///
/// ## read
///
/// ```rust
/// let df = spark
///     .read()
///     .format("csv")
///     .option("header", "True")
///     .option("delimiter", ";")
///     .load(paths)?;
/// ````
#[derive(Clone, Debug)]
pub struct DataFrame {
    /// The [Session] the plan executes in
    pub(crate) session: Box<Session>,

    /// Logical Plan representing the unresolved Relation
    pub(crate) plan: LogicalPlanBuilder,
}

impl DataFrame {
    /// create default DataFrame based on a session and initial logical plan
    pub fn new(session: Session, plan: LogicalPlanBuilder) -> DataFrame {
        DataFrame {
            session: Box::new(session),
            plan,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a [Column] bound to this [DataFrame].
    ///
    /// Unlike `col(name)` it only resolves to columns produced by this
    /// [DataFrame], so both sides of a join can be told apart.
    pub fn col(&self, name: &str) -> Column {
        Column::bound(name, self.plan.plan_id())
    }

    /// Aggregate on the entire [DataFrame] without groups (shorthand for `df.group_by().agg()`)
    pub fn agg<T: ToVecExpr>(self, exprs: T) -> DataFrame {
        self.group_by::<Column>(None).agg(exprs)
    }

    /// Returns all records as a [RecordBatch]
    ///
    /// # Example:
    ///
    /// ```rust
    /// async {
    ///     df.collect().await?;
    /// }
    /// ```
    pub async fn collect(self) -> Result<RecordBatch, FrameError> {
        self.session.execute(&self.plan).await
    }

    /// Retrieves the names of all columns in the [DataFrame] as a `Vec<String>`.
    /// The order of the column names in the list reflects their order in the [DataFrame].
    pub async fn columns(self) -> Result<Vec<String>, FrameError> {
        let schema = self.schema().await?;

        Ok(schema
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .collect())
    }

    /// Returns the number of rows in this [DataFrame]
    pub async fn count(self) -> Result<i64, FrameError> {
        let res = self.agg(count_all()).collect().await?;

        res.column(0)
            .as_primitive_opt::<Int64Type>()
            .map(|counts| counts.value(0))
            .ok_or_else(|| {
                FrameError::AnalysisException("count did not return a Int64 value".to_string())
            })
    }

    /// Returns the plan tree of the [DataFrame] and prints it to the console
    pub fn explain(self) -> String {
        let explain = self.plan.to_string();

        println!("{}", explain);

        explain
    }

    /// Groups the DataFrame using the specified columns, and returns a [GroupedData] object
    pub fn group_by<T: ToVecExpr>(self, cols: Option<T>) -> GroupedData {
        let grouping_cols = match cols {
            Some(cols) => cols.to_vec_expr(),
            None => vec![],
        };
        GroupedData::new(self, grouping_cols)
    }

    /// Returns the first n rows.
    pub async fn head(self, n: Option<usize>) -> Result<RecordBatch, FrameError> {
        self.limit(n.unwrap_or(1)).collect().await
    }

    /// Joins with another DataFrame, using the given join expression.
    ///
    /// The condition is a conjunction of equalities between a column of each
    /// side. Without a condition every row is paired with every other row.
    ///
    /// # Example:
    /// ```rust
    /// let condition = Some(listings.col("id").eq(reviews.col("listing_id")));
    /// let df = listings.join(reviews, condition, JoinType::Inner);
    /// ```
    pub fn join<T: ToExpr>(self, other: DataFrame, on: Option<T>, how: JoinType) -> DataFrame {
        let plan = self.plan.join(other.plan, on, how);

        DataFrame {
            session: self.session,
            plan,
        }
    }

    /// Limits the result count to the number specified and returns a new [DataFrame]
    ///
    /// # Example:
    /// ```rust
    /// async {
    ///     df.limit(10).collect().await?;
    /// }
    /// ```
    pub fn limit(self, limit: usize) -> DataFrame {
        let plan = self.plan.limit(limit);

        DataFrame {
            session: self.session,
            plan,
        }
    }

    /// Alias for [DataFrame::sort]
    pub fn order_by<I>(self, cols: I) -> DataFrame
    where
        I: IntoIterator<Item = Column>,
    {
        self.sort(cols)
    }

    /// Returns the schema of this DataFrame
    pub async fn schema(self) -> Result<SchemaRef, FrameError> {
        Ok(self.limit(0).collect().await?.schema())
    }

    /// Projects a set of expressions and returns a new [DataFrame]
    ///
    /// # Arguments:
    ///
    /// * `cols` - An object that implements [ToVecExpr]
    ///
    /// # Example:
    /// ```rust
    /// async {
    ///     df.select(vec![col("age"), col("name")]).collect().await?;
    /// }
    /// ```
    pub fn select<T: ToVecExpr>(self, cols: T) -> DataFrame {
        let plan = self.plan.select(cols);

        DataFrame {
            session: self.session,
            plan,
        }
    }

    /// Prints the first `n` rows to the console
    ///
    /// # Arguments:
    ///
    /// * `num_rows`: (int, optional) number of rows to show (default 10)
    ///
    pub async fn show(self, num_rows: Option<usize>) -> Result<(), FrameError> {
        println!("{}", self.show_string(num_rows).await?);
        Ok(())
    }

    /// Renders the first `n` rows as a table
    pub async fn show_string(self, num_rows: Option<usize>) -> Result<String, FrameError> {
        let rows = self.limit(num_rows.unwrap_or(10)).collect().await?;

        Ok(pretty::pretty_format_batches(&[rows])?.to_string())
    }

    /// Returns a new [DataFrame] sorted by the specified columns.
    ///
    /// Rows that compare equal keep their relative order.
    pub fn sort<I>(self, cols: I) -> DataFrame
    where
        I: IntoIterator<Item = Column>,
    {
        let plan = self.plan.sort(cols);

        DataFrame {
            session: self.session,
            plan,
        }
    }

    /// Converts a [DataFrame] into a [datafusion::dataframe::DataFrame]
    #[cfg(feature = "datafusion")]
    pub async fn to_datafusion(
        self,
        ctx: &SessionContext,
    ) -> Result<datafusion::dataframe::DataFrame, FrameError> {
        let batch = self.collect().await?;

        Ok(ctx.read_batch(batch)?)
    }

    /// Returns a [DataFrameWriter] struct based on the current [DataFrame]
    pub fn write(self) -> DataFrameWriter {
        DataFrameWriter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array, StringArray};

    use crate::functions::*;
    use crate::SessionBuilder;

    async fn setup() -> Session {
        SessionBuilder::default()
            .app_name("rust_df")
            .build()
            .await
            .unwrap()
    }

    fn listings() -> RecordBatch {
        let id: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
        let name: ArrayRef = Arc::new(StringArray::from(vec![
            "Cozy Loft",
            "Sunny Studio",
            "Empty Nest",
        ]));
        RecordBatch::try_from_iter(vec![("id", id), ("name", name)]).unwrap()
    }

    fn reviews() -> RecordBatch {
        let id: ArrayRef = Arc::new(Int64Array::from(vec![101, 102, 103]));
        let listing_id: ArrayRef = Arc::new(Int64Array::from(vec![1, 1, 2]));
        RecordBatch::try_from_iter(vec![("id", id), ("listing_id", listing_id)]).unwrap()
    }

    #[tokio::test]
    async fn test_reviews_per_listing() -> Result<(), FrameError> {
        let spark = setup().await;

        let listings = spark.create_dataframe(&listings())?;
        let reviews = spark.create_dataframe(&reviews())?;

        let condition = Some(listings.col("id").eq(reviews.col("listing_id")));
        let grouping = vec![listings.col("id"), listings.col("name")];
        let review_id = reviews.col("id");

        let res = listings
            .join(reviews, condition, JoinType::Inner)
            .group_by(Some(grouping))
            .agg(count(review_id).alias("num_reviews"))
            .sort([col("num_reviews").desc(), col("id").asc()])
            .collect()
            .await?;

        let id: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
        let name: ArrayRef = Arc::new(StringArray::from(vec!["Cozy Loft", "Sunny Studio"]));
        let num_reviews: ArrayRef = Arc::new(Int64Array::from(vec![2, 1]));

        let expected = RecordBatch::try_from_iter_with_nullable(vec![
            ("id", id, false),
            ("name", name, false),
            ("num_reviews", num_reviews, false),
        ])?;

        assert_eq!(expected, res);
        Ok(())
    }

    #[tokio::test]
    async fn test_unbound_join_columns_are_ambiguous() -> Result<(), FrameError> {
        let spark = setup().await;

        let listings = spark.create_dataframe(&listings())?;
        let reviews = spark.create_dataframe(&reviews())?;

        let res = listings
            .join(reviews, Some(col("id").eq(col("listing_id"))), JoinType::Inner)
            .select(col("id"))
            .collect()
            .await;

        assert!(matches!(res, Err(FrameError::AnalysisException(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_columns_and_schema() -> Result<(), FrameError> {
        let spark = setup().await;
        let df = spark.create_dataframe(&listings())?;

        assert_eq!(vec!["id", "name"], df.clone().columns().await?);
        assert_eq!(3, df.clone().count().await?);

        let schema = df.select([col("name").alias("title")]).schema().await?;
        assert_eq!("title", schema.field(0).name());
        Ok(())
    }

    #[tokio::test]
    async fn test_head_and_limit() -> Result<(), FrameError> {
        let spark = setup().await;
        let df = spark.create_dataframe(&listings())?;

        assert_eq!(1, df.clone().head(None).await?.num_rows());
        assert_eq!(2, df.clone().head(Some(2)).await?.num_rows());
        assert_eq!(3, df.limit(10).collect().await?.num_rows());
        Ok(())
    }

    #[tokio::test]
    async fn test_order_by_nulls() -> Result<(), FrameError> {
        let spark = setup().await;

        let score: ArrayRef = Arc::new(Int64Array::from(vec![Some(3), None, Some(1)]));
        let data = RecordBatch::try_from_iter(vec![("score", score)])?;
        let df = spark.create_dataframe(&data)?;

        let asc = df.clone().order_by([asc(col("score"))]).collect().await?;
        let desc = df.order_by([desc(col("score"))]).collect().await?;

        let asc: Vec<Option<i64>> = asc.column(0).as_primitive::<Int64Type>().iter().collect();
        let desc: Vec<Option<i64>> = desc.column(0).as_primitive::<Int64Type>().iter().collect();

        assert_eq!(vec![None, Some(1), Some(3)], asc);
        assert_eq!(vec![Some(3), Some(1), None], desc);
        Ok(())
    }

    #[tokio::test]
    async fn test_show_string() -> Result<(), FrameError> {
        let spark = setup().await;
        let df = spark.create_dataframe(&listings())?;

        let table = df.show_string(Some(2)).await?;

        assert!(table.contains("Cozy Loft"));
        assert!(table.contains("Sunny Studio"));
        assert!(!table.contains("Empty Nest"));
        Ok(())
    }

    #[tokio::test]
    async fn test_explain() -> Result<(), FrameError> {
        let spark = setup().await;
        let df = spark.create_dataframe(&listings())?;

        let plan = df.select(["id"]).limit(1).explain();

        assert!(plan.starts_with("Limit"));
        assert!(plan.contains("LocalRelation"));
        Ok(())
    }

    #[cfg(feature = "datafusion")]
    #[tokio::test]
    async fn test_df_to_datafusion() -> Result<(), FrameError> {
        let spark = setup().await;
        let ctx = SessionContext::new();

        let df = spark.create_dataframe(&listings())?;
        let rows = df.to_datafusion(&ctx).await?.collect().await?;

        assert_eq!(listings(), rows[0]);
        Ok(())
    }
}
