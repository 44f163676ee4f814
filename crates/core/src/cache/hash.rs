//! Request identity keys.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the key identifying a request inside a store.
///
/// Only method and URL take part; headers are ignored and the fragment is dropped.
pub fn compute_request_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
