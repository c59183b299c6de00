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

//! Integration tests for the popular-listings binary

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const LISTINGS: &str = "id,name,host_id\n1,Cozy Loft,10\n2,Sunny Studio,11\n3,Empty Nest,12\n";
const REVIEWS: &str = "id,listing_id,comments\n101,1,great\n102,1,nice\n103,2,ok\n";

fn write_inputs(dir: &Path, reviews: &str) -> (PathBuf, PathBuf) {
    let listings_path = dir.join("listings.csv");
    let reviews_path = dir.join("reviews.csv");
    fs::write(&listings_path, LISTINGS).unwrap();
    fs::write(&reviews_path, reviews).unwrap();
    (listings_path, reviews_path)
}

fn part_files(output: &Path) -> Vec<PathBuf> {
    let mut parts: Vec<PathBuf> = fs::read_dir(output)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "csv")
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("part-"))
        })
        .collect();
    parts.sort();
    parts
}

fn popular_listings() -> Command {
    let mut cmd = Command::cargo_bin("popular-listings").unwrap();
    cmd.env("RUST_LOG", "info");
    cmd
}

/// Test the ranking written for a small listings and reviews pair
#[test]
fn test_writes_ranking() {
    let temp_dir = TempDir::new().unwrap();
    let (listings, reviews) = write_inputs(temp_dir.path(), REVIEWS);
    let output = temp_dir.path().join("out");

    popular_listings()
        .arg("--listings")
        .arg(&listings)
        .arg("--reviews")
        .arg(&reviews)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("job finished"));

    let parts = part_files(&output);
    assert_eq!(1, parts.len());
    assert_eq!(
        "id,name,num_reviews\n1,Cozy Loft,2\n2,Sunny Studio,1\n",
        fs::read_to_string(&parts[0]).unwrap()
    );
    assert!(output.join("_SUCCESS").exists());
}

/// Test that a run without arguments fails at the listings load
#[test]
fn test_missing_arguments() {
    popular_listings()
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load listings"));
}

/// Test that an existing output directory is left alone
#[test]
fn test_existing_output() {
    let temp_dir = TempDir::new().unwrap();
    let (listings, reviews) = write_inputs(temp_dir.path(), REVIEWS);
    let output = temp_dir.path().join("out");
    fs::create_dir(&output).unwrap();

    popular_listings()
        .arg("--listings")
        .arg(&listings)
        .arg("--reviews")
        .arg(&reviews)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert!(part_files(&output).is_empty());
}

/// Test that a missing reviews file fails the run
#[test]
fn test_missing_reviews() {
    let temp_dir = TempDir::new().unwrap();
    let (listings, _) = write_inputs(temp_dir.path(), REVIEWS);
    let output = temp_dir.path().join("out");

    popular_listings()
        .arg("--listings")
        .arg(&listings)
        .arg("--reviews")
        .arg(temp_dir.path().join("missing.csv"))
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load reviews"));

    assert!(!output.exists());
}

/// Test that malformed review rows do not abort the run
#[test]
fn test_malformed_reviews_tolerated() {
    let temp_dir = TempDir::new().unwrap();
    let reviews = concat!(
        "id,listing_id,comments\n",
        "101,1,great\n",
        "102,1\n",
        "103,2,ok,extra\n",
        "104,1,\"multi\nline, quoted\"\n",
    );
    let (listings, reviews) = write_inputs(temp_dir.path(), reviews);
    let output = temp_dir.path().join("out");

    popular_listings()
        .arg("--listings")
        .arg(&listings)
        .arg("--reviews")
        .arg(&reviews)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let parts = part_files(&output);
    assert_eq!(
        "id,name,num_reviews\n1,Cozy Loft,3\n2,Sunny Studio,1\n",
        fs::read_to_string(&parts[0]).unwrap()
    );
}

/// Test the generated help text
#[test]
fn test_help() {
    popular_listings()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--listings"))
        .stdout(predicate::str::contains("--reviews"))
        .stdout(predicate::str::contains("--output"));
}
