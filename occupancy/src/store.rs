use std::sync::Arc;

use log::{debug, error};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::index::{BuildPolicy, OccupancyIndex};
use crate::source::EventSource;
use crate::structs::Event;

/// An event collection together with the index built from it.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Bumped by every successful replacement; `0` is the initial empty
    /// snapshot.
    pub generation: u64,
    pub events: Vec<Event>,
    pub index: OccupancyIndex,
}

/// Holds the current [`Snapshot`]. Readers always see a completed index;
/// a replacement swaps the whole snapshot, and the last one to finish wins.
pub struct OccupancyStore {
    policy: BuildPolicy,
    current: RwLock<Arc<Snapshot>>,
}

impl OccupancyStore {
    pub fn new(policy: BuildPolicy) -> Arc<Self> {
        Arc::new(Self {
            policy,
            current: Default::default(),
        })
    }

    pub fn policy(&self) -> BuildPolicy {
        self.policy
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Rebuilds the index from `events` and makes it current. Under the
    /// strict policy a malformed event rejects the collection and the
    /// previous snapshot stays.
    pub async fn replace(&self, events: Vec<Event>) -> Result<Arc<Snapshot>> {
        let index = OccupancyIndex::build_with(&events, self.policy)?;

        let mut current = self.current.write().await;
        let snapshot = Arc::new(Snapshot {
            generation: current.generation + 1,
            events,
            index,
        });
        *current = Arc::clone(&snapshot);

        debug!(
            "occupancy snapshot {} holds {} events over {} days",
            snapshot.generation,
            snapshot.events.len(),
            snapshot.index.len()
        );

        Ok(snapshot)
    }

    /// Fetches from `source` and replaces the snapshot. On failure the error
    /// is logged and returned, and the previous snapshot stays current.
    pub async fn refresh<S: EventSource>(&self, source: &S) -> Result<Arc<Snapshot>> {
        let result = match source.fetch().await {
            Ok(events) => self.replace(events).await,
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            error!("failed to refresh events from {}: {err}", source.describe());
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use chrono::NaiveDate;

    use super::*;
    use crate::Error;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixed(Vec<Event>);

    impl EventSource for Fixed {
        fn fetch(&self) -> impl Future<Output = Result<Vec<Event>>> + Send {
            let events = self.0.clone();
            async move { Ok(events) }
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    struct Failing;

    impl EventSource for Failing {
        async fn fetch(&self) -> Result<Vec<Event>> {
            Err(Error::Status {
                url: "https://backend.example/events".to_string(),
                status: 503,
            })
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn wedding() -> Event {
        Event::all_day("1", "Wedding", date(2024, 6, 1), date(2024, 6, 2))
    }

    fn backwards() -> Event {
        Event::all_day("5", "Backwards", date(2024, 6, 10), date(2024, 6, 8))
    }

    #[tokio::test]
    async fn starts_empty() {
        let store = OccupancyStore::new(BuildPolicy::Lenient);
        let snapshot = store.snapshot().await;

        assert_eq!(snapshot.generation, 0);
        assert!(snapshot.index.is_empty());
    }

    #[tokio::test]
    async fn refresh_swaps_in_a_new_snapshot() {
        let store = OccupancyStore::new(BuildPolicy::Lenient);
        let before = store.snapshot().await;

        store.refresh(&Fixed(vec![wedding()])).await.unwrap();
        let after = store.snapshot().await;

        assert_eq!(after.generation, 1);
        assert!(after.index.is_occupied(date(2024, 6, 2)));
        // Readers holding the old snapshot keep seeing it unchanged.
        assert!(before.index.is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let store = OccupancyStore::new(BuildPolicy::Lenient);
        store.refresh(&Fixed(vec![wedding()])).await.unwrap();

        let result = store.refresh(&Failing).await;
        assert!(matches!(result, Err(Error::Status { status: 503, .. })));

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.generation, 1);
        assert!(snapshot.index.is_occupied(date(2024, 6, 1)));
    }

    #[tokio::test]
    async fn strict_store_rejects_malformed_collection() {
        let store = OccupancyStore::new(BuildPolicy::Strict);
        store.replace(vec![wedding()]).await.unwrap();

        let result = store.replace(vec![wedding(), backwards()]).await;
        assert!(matches!(result, Err(Error::MalformedEvent { .. })));
        assert_eq!(store.snapshot().await.generation, 1);
    }

    #[tokio::test]
    async fn lenient_store_tolerates_malformed_collection() {
        let store = OccupancyStore::new(BuildPolicy::Lenient);
        let snapshot = store.replace(vec![wedding(), backwards()]).await.unwrap();

        assert_eq!(snapshot.index.malformed_events(), 1);
        assert!(snapshot.index.is_occupied(date(2024, 6, 10)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn last_replacement_wins() {
        let store = OccupancyStore::new(BuildPolicy::Lenient);
        let start = Arc::new(tokio::sync::Barrier::new(2));
        let collections = [
            vec![wedding()],
            vec![Event::all_day("2", "Conference", date(2024, 6, 5), date(2024, 6, 5))],
        ];

        let handles = collections.map(|events| {
            let store = Arc::clone(&store);
            let start = Arc::clone(&start);
            tokio::spawn(async move {
                start.wait().await;
                store.replace(events).await.unwrap()
            })
        });
        let mut replaced = Vec::new();
        for handle in handles {
            replaced.push(handle.await.unwrap());
        }

        let mut generations = replaced.iter().map(|s| s.generation).collect::<Vec<_>>();
        generations.sort_unstable();
        assert_eq!(generations, [1, 2]);

        let current = store.snapshot().await;
        let winner = replaced.iter().find(|s| s.generation == 2).unwrap();
        assert_eq!(current.generation, 2);
        assert!(Arc::ptr_eq(&current, winner));
        assert_eq!(current.index, OccupancyIndex::build(&winner.events));
    }
}
