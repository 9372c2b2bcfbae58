//! Query id generation.
//!
//! Ids are a content hash of the request salted with wall-clock time and a
//! process-wide sequence number, so resubmitting the same search always
//! yields a fresh id. Collision-resistant in practice, not cryptographically
//! binding.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use skyfare_shared::SearchRequest;
use uuid::Uuid;

static SALT_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn generate_query_id(request: &SearchRequest) -> String {
    let seq = SALT_SEQ.fetch_add(1, Ordering::Relaxed);

    let nanos = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(now) => now.as_nanos(),
        // Clock before epoch: fall back to a random id rather than refusing
        // the search.
        Err(_) => return Uuid::new_v4().simple().to_string(),
    };

    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            request.origin,
            request.destination,
            request.trip_type,
            request.departure_date,
            request.return_date_or_empty(),
            request.pax,
            nanos,
            seq,
        )
        .as_bytes(),
    );

    let digest = hasher.finalize();
    let mut id = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(id, "{:02x}", byte);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SearchRequest {
        SearchRequest {
            origin: "CGK".into(),
            destination: "DPS".into(),
            trip_type: "one_way".into(),
            departure_date: "2026-09-01".into(),
            return_date: None,
            pax: 1,
        }
    }

    #[test]
    fn test_id_is_hex_sha256() {
        let id = generate_query_id(&request());
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_identical_requests_get_distinct_ids() {
        let req = request();
        let a = generate_query_id(&req);
        let b = generate_query_id(&req);
        assert_ne!(a, b);
    }
}
