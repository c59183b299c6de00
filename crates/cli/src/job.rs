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

//! Reviews per listing
//!
//! Joins listings with their reviews, counts the reviews of every listing
//! and writes the listings ranked by that count as CSV.

use anyhow::{Context, Result};
use popular_listings_core::functions::{col, count};
use popular_listings_core::{CsvOptions, DataFrame, JoinType, ParseMode, SaveMode, Session};
use tracing::info;

/// Locations the job reads from and writes to
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobPaths {
    pub listings: String,
    pub reviews: String,
    pub output: String,
}

/// Options both inputs are read with.
///
/// Quotes are escaped by doubling them and quoted values may span lines,
/// which free text review comments rely on.
pub fn csv_read_options() -> CsvOptions {
    CsvOptions::default()
        .header(true)
        .infer_schema(true)
        .sep(',')
        .quote('"')
        .escape('"')
        .multi_line(true)
        .mode(ParseMode::Permissive)
}

fn csv_write_options() -> CsvOptions {
    CsvOptions::default()
        .header(true)
        .sep(',')
        .quote('"')
        .escape('"')
}

/// Number of reviews of every listing that has at least one review.
///
/// The result has the columns `id`, `name` and `num_reviews`, ordered by
/// `num_reviews` descending and `id` ascending.
pub fn reviews_per_listing(listings: DataFrame, reviews: DataFrame) -> DataFrame {
    // only the keys and the name are carried through the join
    let listings = listings.select([col("id"), col("name")]);
    let reviews = reviews.select([col("id"), col("listing_id")]);

    let condition = Some(listings.col("id").eq(reviews.col("listing_id")));
    let grouping = vec![listings.col("id"), listings.col("name")];
    let review_id = reviews.col("id");

    listings
        .join(reviews, condition, JoinType::Inner)
        .group_by(Some(grouping))
        .agg(count(review_id).alias("num_reviews"))
        .sort([col("num_reviews").desc(), col("id").asc()])
}

/// Runs the job on an active [Session]
pub async fn run(spark: &Session, paths: &JobPaths) -> Result<()> {
    info!(path = %paths.listings, "loading listings");
    let listings = spark
        .read()
        .csv([paths.listings.as_str()], csv_read_options())
        .with_context(|| format!("failed to load listings from {:?}", paths.listings))?;

    info!(path = %paths.reviews, "loading reviews");
    let reviews = spark
        .read()
        .csv([paths.reviews.as_str()], csv_read_options())
        .with_context(|| format!("failed to load reviews from {:?}", paths.reviews))?;

    let popular = reviews_per_listing(listings, reviews);

    info!(path = %paths.output, "writing reviews per listing");
    popular
        .write()
        .mode(SaveMode::ErrorIfExists)
        .csv(&paths.output, csv_write_options())
        .await
        .with_context(|| format!("failed to produce reviews per listing at {:?}", paths.output))?;

    info!("job finished");
    Ok(())
}
