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

use clap::Parser;
use popular_listings::job::{self, JobPaths};
use popular_listings_core::SessionBuilder;
use tracing_subscriber::EnvFilter;

/// Rank listings by their number of reviews
#[derive(Debug, Parser)]
#[command(name = "popular-listings", version)]
#[command(
    about = "Counts the reviews of every listing and writes the ranking as CSV",
    long_about = None
)]
struct Cli {
    /// Listings CSV file or directory of CSV files
    #[arg(long)]
    listings: Option<String>,

    /// Reviews CSV file or directory of CSV files
    #[arg(long)]
    reviews: Option<String>,

    /// Output directory, must not exist yet
    #[arg(long)]
    output: Option<String>,
}

impl From<Cli> for JobPaths {
    fn from(cli: Cli) -> Self {
        JobPaths {
            listings: cli.listings.unwrap_or_default(),
            reviews: cli.reviews.unwrap_or_default(),
            output: cli.output.unwrap_or_default(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let paths = JobPaths::from(Cli::parse());

    let spark = SessionBuilder::default()
        .app_name("popular-listings")
        .build()
        .await?;

    let result = job::run(&spark, &paths).await;
    spark.stop().await;

    result
}
