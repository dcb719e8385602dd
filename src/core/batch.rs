//! Sequential batching of table requests
//!
//! The combined coordinate list is `[origin, grid...]`. It is cut into chunks
//! of `batch_size` coordinates; every request carries the origin as source 0
//! followed by one chunk, and the partial matrices are merged back so that
//! merged index `i` is combined-list index `i`.

use std::ops::Range;
use std::sync::Arc;

use geo::{Coord, Point};

use crate::core::error::{Error, Result};
use crate::core::matrix::{RoutingMatrix, TableRequest, TableService};
use crate::core::options::Profile;

/// Progress callback: (completed requests, total requests)
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Code reported when no chunk was issued
const CODE_NO_REQUEST: &str = "Error";

/// Index ranges into the combined list, one per request
///
/// Chunk `k` covers `[k * batch_size, (k + 1) * batch_size)` except that chunk
/// 0 starts at 1, since the origin is sent as the source of every request.
/// The plan ends at the first empty chunk.
pub fn plan_chunks(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let mut chunks = Vec::new();
    if batch_size == 0 {
        return chunks;
    }
    let mut k = 0usize;
    loop {
        let start = if k == 0 { 1 } else { k.saturating_mul(batch_size) };
        let end = (k.saturating_add(1)).saturating_mul(batch_size).min(len);
        if start >= end {
            break;
        }
        chunks.push(start..end);
        k += 1;
    }
    chunks
}

/// Fetch the travel times from `coordinates[0]` to every coordinate
///
/// Requests are awaited one after the other; chunk `k + 1` is not sent before
/// chunk `k` has been merged. A chunk reporting a code other than `"Ok"` stops
/// the merge and its code is returned in the partial matrix. A transport error
/// or a chunk whose destinations and durations don't cover its request aborts
/// the batch.
pub async fn fetch_matrix<S: TableService>(
    service: &S,
    profile: Profile,
    coordinates: &[Coord<f64>],
    batch_size: usize,
    progress: Option<&ProgressCallback>,
) -> Result<RoutingMatrix> {
    let origin = match coordinates.first() {
        Some(origin) => Point(*origin),
        None => {
            return Err(Error::InvalidInput(
                "At least the origin coordinate is required".to_string(),
            ))
        }
    };

    let chunks = plan_chunks(coordinates.len(), batch_size);
    log::debug!(
        "{} coordinates in {} request(s) of at most {} destinations",
        coordinates.len(),
        chunks.len(),
        batch_size
    );

    let mut merged = RoutingMatrix {
        code: CODE_NO_REQUEST.to_string(),
        message: None,
        sources: Vec::new(),
        destinations: Vec::with_capacity(coordinates.len()),
        durations: vec![Vec::with_capacity(coordinates.len())],
    };
    merged.durations[0].push(Some(0.0));

    let total = chunks.len();
    for (index, chunk) in chunks.into_iter().enumerate() {
        log::trace!("request {}/{} covers {:?}", index + 1, total, chunk);
        let expected = chunk.len() + 1;
        let partial = service
            .table(TableRequest {
                profile,
                origin,
                destinations: &coordinates[chunk],
            })
            .await?;

        merged.code = partial.code.clone();
        if !partial.is_ok() {
            merged.message = partial.message;
            break;
        }
        check_chunk_shape(&partial, index, expected)?;
        merge_chunk(&mut merged, partial);

        if let Some(progress) = progress {
            progress(index + 1, total);
        }
    }

    Ok(merged)
}

/// Merged index `i` must stay the same point in both lists
fn check_chunk_shape(partial: &RoutingMatrix, index: usize, expected: usize) -> Result<()> {
    let destinations = partial.destinations.len();
    let durations = partial.durations.first().map_or(0, Vec::len);
    if destinations != expected || durations != expected {
        return Err(Error::MalformedResponse(format!(
            "chunk {index} has {destinations} destinations and {durations} durations, expected {expected}"
        )));
    }
    Ok(())
}

/// Append one chunk's row and destinations, skipping its origin entry
fn merge_chunk(merged: &mut RoutingMatrix, partial: RoutingMatrix) {
    let RoutingMatrix { sources, destinations, durations, .. } = partial;

    if merged.sources.is_empty() && !sources.is_empty() {
        merged.sources = sources;
    }

    if let Some(row) = durations.into_iter().next() {
        merged.durations[0].extend(row.into_iter().skip(1));
    }

    if destinations.len() > 1 {
        let mut destinations = destinations.into_iter();
        let snapped_origin = destinations.next();
        if merged.destinations.is_empty() {
            merged.destinations.extend(snapped_origin);
        }
        merged.destinations.extend(destinations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matrix::Waypoint;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers from the coordinates themselves: duration is `x * 1000 + y`
    #[derive(Default)]
    struct FakeTable {
        calls: Mutex<Vec<usize>>,
        in_flight: AtomicBool,
        fail_code_on_call: Option<usize>,
        drop_destinations_on_call: Option<usize>,
    }

    fn duration_of(c: Coord<f64>) -> f64 {
        c.x * 1000.0 + c.y
    }

    impl TableService for FakeTable {
        async fn table(&self, request: TableRequest<'_>) -> Result<RoutingMatrix> {
            assert!(!self.in_flight.swap(true, Ordering::SeqCst), "overlapping requests");
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(request.destinations.len());
                calls.len()
            };
            tokio::task::yield_now().await;
            self.in_flight.store(false, Ordering::SeqCst);

            if self.fail_code_on_call == Some(call) {
                return Ok(RoutingMatrix {
                    code: "NoTable".to_string(),
                    message: Some("no table".to_string()),
                    sources: Vec::new(),
                    destinations: Vec::new(),
                    durations: Vec::new(),
                });
            }

            let all: Vec<Coord<f64>> = std::iter::once(request.origin.0)
                .chain(request.destinations.iter().copied())
                .collect();
            let destinations = if self.drop_destinations_on_call == Some(call) {
                Vec::new()
            } else {
                all.iter()
                    .map(|c| Waypoint { location: [c.x, c.y], name: None, distance: None })
                    .collect()
            };
            Ok(RoutingMatrix {
                code: "Ok".to_string(),
                message: None,
                sources: vec![Waypoint { location: [request.origin.x(), request.origin.y()], name: None, distance: None }],
                destinations,
                durations: vec![all
                    .iter()
                    .enumerate()
                    .map(|(i, c)| if i == 0 { Some(0.0) } else { Some(duration_of(*c)) })
                    .collect()],
            })
        }
    }

    fn coordinates(n: usize) -> Vec<Coord<f64>> {
        (0..n)
            .map(|i| Coord { x: (i % 100) as f64 * 0.001, y: (i / 100) as f64 * 0.001 })
            .collect()
    }

    #[test]
    fn test_plan_chunks() {
        assert_eq!(plan_chunks(12_000, 5_000), vec![1..5_000, 5_000..10_000, 10_000..12_000]);
        assert_eq!(plan_chunks(10, 5), vec![1..5, 5..10]);
        assert_eq!(plan_chunks(11, 5), vec![1..5, 5..10, 10..11]);
        assert_eq!(plan_chunks(10, usize::MAX), vec![1..10]);
        assert!(plan_chunks(1, 5).is_empty());
        assert!(plan_chunks(10, 0).is_empty());
    }

    #[tokio::test]
    async fn test_batched_equals_unbatched() {
        let coords = coordinates(12_000);

        let batched_service = FakeTable::default();
        let batched = fetch_matrix(&batched_service, Profile::Car, &coords, 5_000, None)
            .await
            .unwrap();
        assert_eq!(*batched_service.calls.lock().unwrap(), vec![4_999, 5_000, 2_000]);

        let single_service = FakeTable::default();
        let single = fetch_matrix(&single_service, Profile::Car, &coords, usize::MAX, None)
            .await
            .unwrap();
        assert_eq!(single_service.calls.lock().unwrap().len(), 1);

        assert!(batched.is_ok());
        assert_eq!(batched.destinations.len(), 12_000);
        assert_eq!(batched.travel_times().len(), 12_000);
        assert_eq!(batched, single);

        for (i, (waypoint, duration)) in batched.destinations.iter().zip(batched.travel_times()).enumerate().skip(1) {
            assert_eq!(waypoint.coord(), coords[i]);
            assert_eq!(*duration, Some(duration_of(coords[i])));
        }
        assert_eq!(batched.travel_times()[0], Some(0.0));
        assert_eq!(batched.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_provider_code_stops_merge() {
        let coords = coordinates(30);
        let service = FakeTable { fail_code_on_call: Some(2), ..Default::default() };
        let matrix = fetch_matrix(&service, Profile::Foot, &coords, 10, None).await.unwrap();

        assert_eq!(matrix.code, "NoTable");
        assert_eq!(service.calls.lock().unwrap().len(), 2);
        // only the first chunk was merged
        assert_eq!(matrix.destinations.len(), 10);
        assert_eq!(matrix.travel_times().len(), 10);
    }

    #[tokio::test]
    async fn test_misaligned_chunk_is_malformed() {
        let coords = coordinates(30);
        let service = FakeTable { drop_destinations_on_call: Some(2), ..Default::default() };
        let err = fetch_matrix(&service, Profile::Car, &coords, 10, None).await.unwrap_err();

        match err {
            Error::MalformedResponse(message) => assert!(message.contains("chunk 1"), "{message}"),
            other => panic!("expected malformed response, got {other:?}"),
        }
        // the third request is never sent
        assert_eq!(service.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_progress_reports_each_request() {
        let coords = coordinates(25);
        let seen = Arc::new(AtomicUsize::new(0));
        let callback: ProgressCallback = {
            let seen = seen.clone();
            Arc::new(move |done, total| {
                assert_eq!(total, 3);
                seen.store(done, Ordering::SeqCst);
            })
        };

        fetch_matrix(&FakeTable::default(), Profile::Car, &coords, 10, Some(&callback))
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_origin_only() {
        let coords = coordinates(1);
        let service = FakeTable::default();
        let matrix = fetch_matrix(&service, Profile::Car, &coords, 10, None).await.unwrap();
        assert!(service.calls.lock().unwrap().is_empty());
        assert_eq!(matrix.code, "Error");

        let err = fetch_matrix(&service, Profile::Car, &[], 10, None).await.unwrap_err();
        assert!(err.is_client_error());
    }
}
