// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Bounded-batch async helpers.
//!
//! Bulk provider operations run in fixed-size batches: up to `batch_size`
//! futures are in flight at once, and the next batch starts only after the
//! current one fully settles. This bounds outstanding I/O against the storage
//! backend at the cost of some head-of-line blocking. Results are collected
//! positionally, so output order always matches input order regardless of
//! completion order within a batch.

use futures::future::join_all;
use std::future::Future;

/// Default number of in-flight operations per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// The configured batch size: `LABELKIT_BATCH_SIZE` or the default.
pub fn batch_size() -> usize {
    std::env::var("LABELKIT_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Map `items` through an async operation in bounded batches.
///
/// Batch N+1 never starts before every future in batch N has settled. A
/// `batch_size` of zero is treated as one.
pub async fn map_batched<T, R, F, Fut>(items: Vec<T>, batch_size: usize, op: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut pending = items.into_iter();

    loop {
        let batch: Vec<Fut> = pending.by_ref().take(batch_size).map(&op).collect();
        if batch.is_empty() {
            break;
        }
        results.extend(join_all(batch).await);
    }

    results
}

/// Run an async operation over `items` in bounded batches, discarding
/// results.
pub async fn for_each_batched<T, F, Fut>(items: Vec<T>, batch_size: usize, op: F)
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()>,
{
    map_batched(items, batch_size, op).await;
}
