//! Per-domain crawl frontier
//!
//! Holds the targets waiting to be fetched and every URL ever accepted, so
//! each normalized URL is handed out at most once per domain. The visited
//! check and the queue push happen under one lock.

use crate::url::normalize_url;
use crate::UrlError;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// A URL to crawl for one domain
///
/// Immutable once created; the URL is always normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    domain: String,
    url: Url,
    depth: u32,
    discovered_at: DateTime<Utc>,
}

impl CrawlTarget {
    /// Creates a target from a raw URL string, normalizing it
    pub fn new(domain: impl Into<String>, url: &str, depth: u32) -> Result<Self, UrlError> {
        Ok(Self::from_normalized(domain, normalize_url(url)?, depth))
    }

    /// Creates a target from a URL that has already been normalized
    pub fn from_normalized(domain: impl Into<String>, url: Url, depth: u32) -> Self {
        Self {
            domain: domain.into(),
            url,
            depth,
            discovered_at: Utc::now(),
        }
    }

    /// A target one hop deeper, found on this target's page
    pub fn child(&self, url: Url) -> Self {
        Self::from_normalized(self.domain.clone(), url, self.depth + 1)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }
}

/// A queued target with its insertion sequence number
#[derive(Debug)]
struct FrontierEntry {
    target: CrawlTarget,
    seq: u64,
}

// BinaryHeap pops the greatest entry: shallower depth first, then oldest
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .target
            .depth
            .cmp(&self.target.depth)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for FrontierEntry {}

/// Outcome of asking the frontier for work
#[derive(Debug)]
pub enum Dequeue {
    /// A target to fetch; the caller must call [`Frontier::complete`] when done
    Ready(CrawlTarget),
    /// Nothing queued, but in-flight fetches may still add targets
    Pending,
    /// Nothing queued and nothing in flight: the domain is done
    Quiescent,
}

#[derive(Debug, Default)]
struct Inner {
    visited: HashSet<String>,
    queue: BinaryHeap<FrontierEntry>,
    in_flight: usize,
    next_seq: u64,
    closed: bool,
}

/// Frontier and dedup store for one domain
#[derive(Debug)]
pub struct Frontier {
    max_depth: u32,
    inner: Mutex<Inner>,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    // A panic while holding the lock cannot leave Inner half-updated
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a target unless it is too deep or its URL was seen before
    ///
    /// # Arguments
    ///
    /// * `target` - A normalized URL and the depth it was found at
    ///
    /// # Returns
    ///
    /// * `true` - The target was queued
    /// * `false` - Too deep, already seen, or the frontier is closed
    pub fn enqueue(&self, target: CrawlTarget) -> bool {
        // Step 1: Depth bound
        if target.depth > self.max_depth {
            return false;
        }

        // Step 2: Each URL is queued at most once
        let mut inner = self.lock();
        if inner.closed || !inner.visited.insert(target.url.as_str().to_string()) {
            return false;
        }

        // Step 3: Shallowest first, insertion order within a depth
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.push(FrontierEntry { target, seq });
        true
    }

    /// Takes the next target, or reports why there is none
    ///
    /// # Returns
    ///
    /// * `Dequeue::Ready` - The shallowest queued target; it counts as in
    ///   flight until [`Frontier::complete`] is called
    /// * `Dequeue::Pending` - Nothing queued yet, but in-flight targets may
    ///   still add more
    /// * `Dequeue::Quiescent` - Nothing queued and nothing in flight
    pub fn dequeue(&self) -> Dequeue {
        let mut inner = self.lock();
        match inner.queue.pop() {
            Some(entry) => {
                inner.in_flight += 1;
                Dequeue::Ready(entry.target)
            }
            None if inner.in_flight > 0 => Dequeue::Pending,
            None => Dequeue::Quiescent,
        }
    }

    /// Marks a dequeued target as finished
    pub fn complete(&self) {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    /// Records a URL as seen without queueing it
    ///
    /// Used for redirect targets, so a page reached through a redirect is not
    /// fetched again under its final URL. Returns false if it was already seen.
    pub fn mark_visited(&self, url: &Url) -> bool {
        self.lock().visited.insert(url.as_str().to_string())
    }

    /// Stops accepting work and drops everything still queued
    ///
    /// Returns the number of targets dropped.
    pub fn close(&self) -> usize {
        let mut inner = self.lock();
        inner.closed = true;
        let dropped = inner.queue.len();
        inner.queue.clear();
        dropped
    }

    /// Targets waiting to be dequeued
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Targets dequeued but not yet completed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// URLs ever accepted or marked visited
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn target(url: &str, depth: u32) -> CrawlTarget {
        CrawlTarget::new("shop.example", url, depth).unwrap()
    }

    fn ready(frontier: &Frontier) -> CrawlTarget {
        match frontier.dequeue() {
            Dequeue::Ready(t) => t,
            other => panic!("expected a target, got {:?}", other),
        }
    }

    #[test]
    fn test_target_is_normalized() {
        let t = target("https://Shop.Example/p/1/?utm_source=x#top", 0);
        assert_eq!(t.url().as_str(), "https://shop.example/p/1");
        assert_eq!(t.domain(), "shop.example");

        let child = t.child(Url::parse("https://shop.example/p/2").unwrap());
        assert_eq!(child.depth(), 1);
        assert!(child.discovered_at() >= t.discovered_at());
    }

    #[test]
    fn test_enqueue_rejects_duplicates() {
        let frontier = Frontier::new(3);
        assert!(frontier.enqueue(target("https://shop.example/p/1", 0)));
        assert!(!frontier.enqueue(target("https://shop.example/p/1", 1)));
        // Same node after normalization
        assert!(!frontier.enqueue(target("https://SHOP.example/p/1/#reviews", 1)));
        assert_eq!(frontier.pending(), 1);
    }

    #[test]
    fn test_enqueue_rejects_too_deep() {
        let frontier = Frontier::new(1);
        assert!(frontier.enqueue(target("https://shop.example/a", 1)));
        assert!(!frontier.enqueue(target("https://shop.example/b", 2)));
        // Rejected targets are not marked visited
        assert!(frontier.enqueue(target("https://shop.example/b", 1)));
    }

    #[test]
    fn test_dequeued_once() {
        let frontier = Frontier::new(3);
        frontier.enqueue(target("https://shop.example/p/1", 0));

        let t = ready(&frontier);
        assert_eq!(t.url().as_str(), "https://shop.example/p/1");
        assert!(matches!(frontier.dequeue(), Dequeue::Pending));

        // Re-discovering a fetched URL does not queue it again
        assert!(!frontier.enqueue(target("https://shop.example/p/1", 1)));
        frontier.complete();
        assert!(matches!(frontier.dequeue(), Dequeue::Quiescent));
    }

    #[test]
    fn test_shallow_first_then_fifo() {
        let frontier = Frontier::new(3);
        frontier.enqueue(target("https://shop.example/deep", 2));
        frontier.enqueue(target("https://shop.example/a", 1));
        frontier.enqueue(target("https://shop.example/b", 1));
        frontier.enqueue(target("https://shop.example/", 0));

        let order: Vec<String> = (0..4)
            .map(|_| ready(&frontier).url().path().to_string())
            .collect();
        assert_eq!(order, vec!["/", "/a", "/b", "/deep"]);
    }

    #[test]
    fn test_quiescence_waits_for_in_flight() {
        let frontier = Frontier::new(3);
        assert!(matches!(frontier.dequeue(), Dequeue::Quiescent));

        frontier.enqueue(target("https://shop.example/", 0));
        let _seed = ready(&frontier);
        assert_eq!(frontier.in_flight(), 1);
        assert!(matches!(frontier.dequeue(), Dequeue::Pending));

        // The in-flight fetch discovers a link before completing
        frontier.enqueue(target("https://shop.example/p/1", 1));
        frontier.complete();
        let _child = ready(&frontier);
        frontier.complete();
        assert!(matches!(frontier.dequeue(), Dequeue::Quiescent));
    }

    #[test]
    fn test_mark_visited_blocks_enqueue() {
        let frontier = Frontier::new(3);
        let url = normalize_url("https://shop.example/p/9").unwrap();
        assert!(frontier.mark_visited(&url));
        assert!(!frontier.mark_visited(&url));
        assert_eq!(frontier.visited_count(), 1);
        assert!(!frontier.enqueue(target("https://shop.example/p/9", 1)));
    }

    #[test]
    fn test_close_drains_queue() {
        let frontier = Frontier::new(3);
        frontier.enqueue(target("https://shop.example/a", 0));
        frontier.enqueue(target("https://shop.example/b", 0));

        assert_eq!(frontier.close(), 2);
        assert!(!frontier.enqueue(target("https://shop.example/c", 0)));
        assert!(matches!(frontier.dequeue(), Dequeue::Quiescent));
    }

    #[test]
    fn test_concurrent_enqueue_same_url() {
        let frontier = Arc::new(Frontier::new(3));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let frontier = frontier.clone();
                std::thread::spawn(move || frontier.enqueue(target("https://shop.example/p/1", 1)))
            })
            .collect();

        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();
        assert_eq!(added, 1);
        assert_eq!(frontier.pending(), 1);
    }

    #[test]
    fn test_round_trip_every_url_exactly_once() {
        let frontier = Frontier::new(5);
        let urls: Vec<String> = (0..50)
            .map(|i| format!("https://shop.example/p/{}", i % 25))
            .collect();
        for (i, url) in urls.iter().enumerate() {
            frontier.enqueue(target(url, (i % 5) as u32));
        }

        let mut seen = HashSet::new();
        while let Dequeue::Ready(t) = frontier.dequeue() {
            assert!(seen.insert(t.url().to_string()));
            frontier.complete();
        }
        assert_eq!(seen.len(), 25);
    }
}
