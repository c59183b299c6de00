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

//! Local DataFrame engine for Rust
//!
//! A [DataFrame] is a lazily built logical plan over Apache Arrow record
//! batches. Plans are executed in memory by the [Session] that created them
//! once an action is called. CSV files are the data source and sink.
//!
//! # Quickstart
//!
//! Create a Session and create a [DataFrame] from a [arrow::array::RecordBatch].
//!
//! ```rust
//! use popular_listings_core::{Session, SessionBuilder};
//! use popular_listings_core::functions::col;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//!     let spark: Session = SessionBuilder::default()
//!         .app_name("example_rs")
//!         .build()
//!         .await?;
//!
//!     let name: ArrayRef = Arc::new(StringArray::from(vec!["Tom", "Alice", "Bob"]));
//!     let age: ArrayRef = Arc::new(Int64Array::from(vec![14, 23, 16]));
//!
//!     let data = RecordBatch::try_from_iter(vec![("name", name), ("age", age)])?;
//!
//!     let df = spark.create_dataframe(&data)?;
//!
//!     // 3 records total
//!     let records = df.select([col("name")]).count().await?;
//!
//!     Ok(())
//! };
//!```
//!
//! Create a Session, read CSV files into DataFrames, join and aggregate them, and write the results:
//!
//! ```rust
//! use popular_listings_core::{CsvOptions, JoinType, SessionBuilder};
//!
//! use popular_listings_core::functions as F;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//!     let spark = SessionBuilder::default().build().await?;
//!
//!     let opts = || CsvOptions::default().header(true).infer_schema(true);
//!
//!     let listings = spark.read().csv(["/datasets/listings.csv"], opts())?;
//!     let reviews = spark.read().csv(["/datasets/reviews.csv"], opts())?;
//!
//!     let condition = Some(listings.col("id").eq(reviews.col("listing_id")));
//!     let grouping = vec![listings.col("id"), listings.col("name")];
//!     let review_id = reviews.col("id");
//!
//!     let df = listings
//!         .join(reviews, condition, JoinType::Inner)
//!         .group_by(Some(grouping))
//!         .agg(F::count(review_id).alias("num_reviews"))
//!         .sort([F::col("num_reviews").desc()]);
//!
//!     df.write()
//!       .format("csv")
//!       .option("header", "true")
//!       .save("/tmp/popular_listings/")
//!       .await?;
//!
//!     spark.stop().await;
//!
//!     Ok(())
//! };
//!```

pub mod column;
pub mod conf;
pub mod dataframe;
pub mod errors;
pub mod expressions;
pub mod functions;
pub mod group;
pub mod plan;
pub mod readwriter;
pub mod session;
pub mod types;

mod datasource;
mod execution;

pub use dataframe::{DataFrame, DataFrameReader, DataFrameWriter, JoinType, SaveMode};
pub use errors::FrameError;
pub use readwriter::{ConfigOpts, CsvOptions, ParseMode};
pub use session::{Session, SessionBuilder};
