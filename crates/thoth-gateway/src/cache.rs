use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

/// Response cache keyed by `(method, full-url, sorted-params, body-hash)`
/// (spec §4.5). In-memory, TTL per entry, soft max with LRU eviction.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Entry>>,
    max_entries: usize,
}

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
    last_used: Instant,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), max_entries }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        let hit = match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.last_used = now;
                Some(entry.value.clone())
            }
            Some(_) => None,
            None => None,
        };
        if hit.is_none() {
            entries.remove(key);
        }
        hit
    }

    pub fn put(&self, key: String, value: serde_json::Value, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(oldest_key) = entries.iter().min_by_key(|(_, e)| e.last_used).map(|(k, _)| k.clone()) {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(key, Entry { value, expires_at: now + ttl, last_used: now });
    }

    pub fn cache_key(method: &str, url: &str, sorted_params: &str, body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body);
        let body_hash = hex::encode(hasher.finalize());
        format!("{method}:{url}:{sorted_params}:{body_hash}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stores_and_returns_until_expiry() {
        let cache = ResponseCache::new(10);
        cache.put("k".to_string(), json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache = ResponseCache::new(10);
        cache.put("k".to_string(), json!(1), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn evicts_least_recently_used_when_over_capacity() {
        let cache = ResponseCache::new(2);
        cache.put("a".to_string(), json!(1), Duration::from_secs(60));
        cache.put("b".to_string(), json!(2), Duration::from_secs(60));
        cache.get("a");
        cache.put("c".to_string(), json!(3), Duration::from_secs(60));
        assert_eq!(cache.get("b"), None);
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }
}
