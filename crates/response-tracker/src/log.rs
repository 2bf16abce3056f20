//! Append-only bounded response log.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::model::ResponseEntry;

/// FIFO-bounded store of response entries.
///
/// Once the capacity is exceeded the oldest entry is evicted, so a
/// long-running session trades early history for a memory bound. A
/// capacity of zero disables the bound.
#[derive(Debug)]
pub struct ResponseLog {
    capacity: usize,
    queue: Mutex<VecDeque<ResponseEntry>>,
}

impl ResponseLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(&self, entry: ResponseEntry) {
        let mut guard = self.queue.lock();
        if self.capacity > 0 && guard.len() >= self.capacity {
            guard.pop_front();
        }
        guard.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Entries in insertion order.
    pub fn snapshot(&self) -> Vec<ResponseEntry> {
        self.queue.lock().iter().cloned().collect()
    }

    /// First entry satisfying the predicate, in insertion order.
    pub fn first_match<F>(&self, predicate: F) -> Option<ResponseEntry>
    where
        F: Fn(&ResponseEntry) -> bool,
    {
        self.queue
            .lock()
            .iter()
            .find(|entry| predicate(entry))
            .cloned()
    }

    pub fn count_matches<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ResponseEntry) -> bool,
    {
        self.queue
            .lock()
            .iter()
            .filter(|entry| predicate(entry))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;

    fn entry(url: &str) -> ResponseEntry {
        ResponseEntry {
            url: url.to_string(),
            method: "GET".to_string(),
            status: 200,
            timestamp: Utc::now(),
            headers: HashMap::new(),
            is_ok: true,
            status_text: "OK".to_string(),
            body: None,
            body_error: None,
            body_text: None,
        }
    }

    #[test]
    fn eviction_drops_the_oldest_entry() {
        let log = ResponseLog::new(2);
        log.push(entry("https://fakestoreapi.com/a"));
        log.push(entry("https://fakestoreapi.com/b"));
        log.push(entry("https://fakestoreapi.com/c"));

        let urls: Vec<String> = log.snapshot().into_iter().map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec!["https://fakestoreapi.com/b", "https://fakestoreapi.com/c"]
        );
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn first_match_follows_insertion_order() {
        let log = ResponseLog::new(10);
        log.push(entry("https://fakestoreapi.com/products/1"));
        log.push(entry("https://fakestoreapi.com/products/2"));

        let found = log
            .first_match(|e| e.url.contains("/products"))
            .expect("match");
        assert_eq!(found.url, "https://fakestoreapi.com/products/1");
        assert_eq!(log.count_matches(|e| e.url.contains("/products")), 2);
    }

    #[test]
    fn clear_empties_the_log_in_place() {
        let log = ResponseLog::new(4);
        log.push(entry("https://fakestoreapi.com/a"));
        log.clear();
        assert!(log.is_empty());
        log.push(entry("https://fakestoreapi.com/b"));
        assert_eq!(log.len(), 1);
    }
}
