//! Watchlist construction and installation
//!
//! A [`Watchlist`] is built once from a source document and never mutated.
//! [`WatchlistStore`] holds the currently installed list and swaps in a
//! replacement only after it is fully built, so readers always see either
//! the previous list or the new one.

use crate::document::{parse_document, NamePart, NamePartKind, PartyRecord};
use crate::error::LoadError;
use crate::similarity::Phrase;
use crate::source::WatchlistSource;
use crate::types::EntityType;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A sanctioned party prepared for scoring
#[derive(Debug, Clone)]
pub struct WatchlistEntry {
    pub id: Option<String>,
    pub given_name: String,
    pub surname: String,
    pub full_name: String,
    pub entity_type: EntityType,
    pub party_type: Option<String>,
    pub programs: Vec<String>,
    pub remarks: Option<String>,
    name_parts: Vec<NamePart>,
    all_text: String,
    phrases: Vec<Phrase>,
}

impl WatchlistEntry {
    /// Build an entry, or `None` when the record has no resolvable name.
    ///
    /// The full name is the whole-name part if present, else
    /// `surname + " " + given name`. The scoring text is every name part
    /// followed by the full name, all lowercased.
    pub fn from_record(record: PartyRecord) -> Option<Self> {
        let mut given_name = String::new();
        let mut surname = String::new();
        let mut whole_name = String::new();
        let mut all_parts = Vec::with_capacity(record.name_parts.len() + 1);

        for part in &record.name_parts {
            all_parts.push(part.value.to_lowercase());
            match part.kind {
                NamePartKind::GivenName => given_name = part.value.clone(),
                NamePartKind::Surname => surname = part.value.clone(),
                NamePartKind::WholeName => whole_name = part.value.clone(),
                NamePartKind::Other => {}
            }
        }

        let full_name = if whole_name.trim().is_empty() {
            format!("{} {}", surname, given_name).trim().to_string()
        } else {
            whole_name.trim().to_string()
        };
        if full_name.is_empty() {
            return None;
        }

        all_parts.push(full_name.to_lowercase());
        let all_text = all_parts.join(" ");
        let phrases = Phrase::pairs_of(&all_text);
        let entity_type = record
            .party_type
            .as_deref()
            .map(EntityType::from_label)
            .unwrap_or(EntityType::Unknown);

        Some(Self {
            id: record.id,
            given_name,
            surname,
            full_name,
            entity_type,
            party_type: record.party_type,
            programs: record.programs,
            remarks: record.remarks,
            name_parts: record.name_parts,
            all_text,
            phrases,
        })
    }

    /// Lowercased name parts plus the full name, space-joined
    pub fn all_text(&self) -> &str {
        &self.all_text
    }

    /// Word-pairs of [`all_text`](Self::all_text) with bigrams precomputed
    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    /// The record this entry was built from
    pub fn to_record(&self) -> PartyRecord {
        PartyRecord {
            id: self.id.clone(),
            party_type: self.party_type.clone(),
            name_parts: self.name_parts.clone(),
            programs: self.programs.clone(),
            remarks: self.remarks.clone(),
        }
    }
}

/// Immutable, ordered set of watchlist entries
#[derive(Debug, Clone)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
    source: String,
    loaded_at: DateTime<Utc>,
    skipped: usize,
}

impl Watchlist {
    /// Build from records, dropping those without a resolvable name
    pub fn from_records(source: impl Into<String>, records: Vec<PartyRecord>) -> Self {
        let total = records.len();
        let entries: Vec<WatchlistEntry> = records
            .into_iter()
            .filter_map(WatchlistEntry::from_record)
            .collect();
        let skipped = total - entries.len();

        Self {
            entries,
            source: source.into(),
            loaded_at: Utc::now(),
            skipped,
        }
    }

    /// Entries in load order
    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchlistEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Records dropped for lacking a name
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn to_records(&self) -> Vec<PartyRecord> {
        self.entries.iter().map(WatchlistEntry::to_record).collect()
    }
}

/// Holds the installed watchlist
pub struct WatchlistStore {
    current: RwLock<Option<Arc<Watchlist>>>,
    // Serializes loads so only one writer builds at a time
    load_lock: Mutex<()>,
    reject_empty: bool,
}

impl Default for WatchlistStore {
    fn default() -> Self {
        Self::new(false)
    }
}

impl WatchlistStore {
    /// `reject_empty` turns a document without usable entries into
    /// [`LoadError::EmptyWatchlist`] instead of installing an empty list.
    pub fn new(reject_empty: bool) -> Self {
        Self {
            current: RwLock::new(None),
            load_lock: Mutex::new(()),
            reject_empty,
        }
    }

    /// Fetch, parse and build a watchlist, then install it.
    ///
    /// On any error the previously installed list stays in place.
    pub async fn load(&self, source: &dyn WatchlistSource) -> Result<Arc<Watchlist>, LoadError> {
        let _guard = self.load_lock.lock().await;
        let source_name = source.describe();

        let watchlist = match Self::build(source).await {
            Ok(watchlist) => watchlist,
            Err(e) => {
                error!("Failed to load watchlist from {}: {}", source_name, e);
                return Err(e);
            }
        };

        if watchlist.is_empty() {
            if self.reject_empty {
                warn!("Rejected empty watchlist from {}", source_name);
                return Err(LoadError::EmptyWatchlist { source_name });
            }
            warn!(
                "Watchlist from {} has no usable entries; every query will report no match",
                source_name
            );
        }

        Ok(self.install(watchlist))
    }

    async fn build(source: &dyn WatchlistSource) -> Result<Watchlist, LoadError> {
        let document = source.fetch().await?;
        let source_name = source.describe();

        // Parsing and bigram precomputation are CPU-bound
        tokio::task::spawn_blocking(move || -> Result<Watchlist, LoadError> {
            let records = parse_document(&document.body, document.format)?;
            Ok(Watchlist::from_records(source_name, records))
        })
        .await
        .map_err(|e| LoadError::MalformedDocument(format!("Watchlist build task failed: {}", e)))?
    }

    /// Install an already built watchlist, replacing the current one
    pub fn install(&self, watchlist: Watchlist) -> Arc<Watchlist> {
        let watchlist = Arc::new(watchlist);
        info!(
            "Loaded watchlist from {} with {} entries ({} skipped)",
            watchlist.source(),
            watchlist.len(),
            watchlist.skipped()
        );
        *self.current.write() = Some(Arc::clone(&watchlist));
        watchlist
    }

    /// Whether a watchlist has been installed
    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// The installed watchlist. Holding the snapshot keeps it alive across
    /// later reloads.
    pub fn snapshot(&self) -> Option<Arc<Watchlist>> {
        self.current.read().clone()
    }

    /// Reload from `source` every `interval`. Failures are logged and the
    /// installed watchlist is kept. The task holds only a weak reference and
    /// ends at the first tick after the store is dropped.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        source: Arc<dyn WatchlistSource>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("Watchlist store dropped, stopping refresh from {}", source.describe());
                    break;
                };
                debug!("Refreshing watchlist from {}", source.describe());
                if let Err(e) = store.load(source.as_ref()).await {
                    warn!("Watchlist refresh failed, keeping current list: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentFormat;
    use crate::source::{SourceDocument, StaticSource};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(parts: &[(NamePartKind, &str)]) -> PartyRecord {
        PartyRecord {
            id: Some("1".to_string()),
            party_type: Some("Individual".to_string()),
            name_parts: parts.iter().map(|(k, v)| NamePart::new(*k, *v)).collect(),
            programs: vec!["SDGT".to_string()],
            remarks: None,
        }
    }

    #[test]
    fn test_full_name_from_surname_and_given_name() {
        let entry = WatchlistEntry::from_record(record(&[
            (NamePartKind::GivenName, "Juan"),
            (NamePartKind::Surname, "Fernandez"),
        ]))
        .unwrap();

        assert_eq!(entry.full_name, "Fernandez Juan");
        assert_eq!(entry.all_text(), "juan fernandez fernandez juan");
        assert_eq!(entry.entity_type, EntityType::Individual);
        assert_eq!(entry.phrases().len(), 3);
    }

    #[test]
    fn test_whole_name_wins() {
        let entry = WatchlistEntry::from_record(record(&[
            (NamePartKind::Surname, "Fernandez"),
            (NamePartKind::WholeName, "Juan Fernandez"),
        ]))
        .unwrap();

        assert_eq!(entry.full_name, "Juan Fernandez");
        assert_eq!(entry.all_text(), "fernandez juan fernandez juan fernandez");
    }

    #[test]
    fn test_given_name_only() {
        let entry = WatchlistEntry::from_record(record(&[(NamePartKind::GivenName, "Juan")])).unwrap();
        assert_eq!(entry.full_name, "Juan");
    }

    #[test]
    fn test_nameless_records_are_skipped() {
        let records = vec![
            record(&[]),
            record(&[(NamePartKind::Other, "alias only")]),
            record(&[(NamePartKind::WholeName, "Banco Nacional de Cuba")]),
        ];

        let watchlist = Watchlist::from_records("test", records);
        assert_eq!(watchlist.len(), 1);
        assert_eq!(watchlist.skipped(), 2);
        assert_eq!(watchlist.entries()[0].full_name, "Banco Nacional de Cuba");
    }

    #[tokio::test]
    async fn test_store_not_ready_until_loaded() {
        let store = WatchlistStore::default();
        assert!(!store.is_ready());
        assert!(store.snapshot().is_none());

        let source = StaticSource::xml(
            "one",
            "<SanctionsList><DistinctParty><NamePart><NamePartType>WholeName</NamePartType>\
             <NamePartValue>Juan Fernandez</NamePartValue></NamePart></DistinctParty></SanctionsList>",
        );
        let watchlist = store.load(&source).await.unwrap();

        assert!(store.is_ready());
        assert_eq!(watchlist.len(), 1);
        assert_eq!(watchlist.source(), "static:one");
    }

    #[tokio::test]
    async fn test_empty_watchlist_policy() {
        let empty = StaticSource::xml("empty", "<SanctionsList></SanctionsList>");

        let lenient = WatchlistStore::new(false);
        assert!(lenient.load(&empty).await.unwrap().is_empty());
        assert!(lenient.is_ready());

        let strict = WatchlistStore::new(true);
        assert!(matches!(
            strict.load(&empty).await,
            Err(LoadError::EmptyWatchlist { .. })
        ));
        assert!(!strict.is_ready());
    }

    fn list_xml(names: &[&str]) -> String {
        let parties: String = names
            .iter()
            .map(|name| {
                format!(
                    "<DistinctParty><NamePart><NamePartType>WholeName</NamePartType>\
                     <NamePartValue>{}</NamePartValue></NamePart></DistinctParty>",
                    name
                )
            })
            .collect();
        format!("<SanctionsList>{}</SanctionsList>", parties)
    }

    /// Serves queued fetch results in order, then reports itself unavailable
    struct QueuedSource {
        fetches: AtomicUsize,
        queue: parking_lot::Mutex<VecDeque<Result<SourceDocument, LoadError>>>,
    }

    impl QueuedSource {
        fn new(results: Vec<Result<SourceDocument, LoadError>>) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                queue: parking_lot::Mutex::new(results.into()),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WatchlistSource for QueuedSource {
        fn describe(&self) -> String {
            "queued".to_string()
        }

        async fn fetch(&self) -> Result<SourceDocument, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(LoadError::unavailable("queued", "queue drained")))
        }
    }

    fn xml_document(names: &[&str]) -> Result<SourceDocument, LoadError> {
        Ok(SourceDocument {
            body: list_xml(names),
            format: DocumentFormat::Xml,
        })
    }

    /// Advance paused time in one-second steps until `done` holds
    async fn advance_until(done: impl Fn() -> bool) {
        for _ in 0..600 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        panic!("condition not reached within ten minutes of paused time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_swaps_list_and_keeps_it_on_failure() {
        let interval = Duration::from_secs(60);
        let store = Arc::new(WatchlistStore::default());
        store
            .load(&StaticSource::xml("initial", list_xml(&["Juan Fernandez"])))
            .await
            .unwrap();

        let source = Arc::new(QueuedSource::new(vec![
            xml_document(&["Maria Gonzalez", "Ivan Petrov"]),
            Err(LoadError::MalformedDocument("truncated".to_string())),
        ]));
        let task = store.spawn_refresh(source.clone(), interval);

        // Nothing is fetched before the first interval elapses
        tokio::time::sleep(interval / 2).await;
        assert_eq!(source.fetches(), 0);
        assert_eq!(store.snapshot().unwrap().source(), "static:initial");

        advance_until(|| store.snapshot().map_or(false, |w| w.len() == 2)).await;
        let refreshed = store.snapshot().unwrap();
        assert_eq!(refreshed.source(), "queued");
        assert_eq!(refreshed.entries()[0].full_name, "Maria Gonzalez");

        // The malformed document and the drained queue both leave it in place
        advance_until(|| source.fetches() >= 3).await;
        assert!(Arc::ptr_eq(&store.snapshot().unwrap(), &refreshed));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_ends_when_store_dropped() {
        let interval = Duration::from_secs(60);
        let store = Arc::new(WatchlistStore::default());
        let source = Arc::new(QueuedSource::new(Vec::new()));

        let task = store.spawn_refresh(source.clone(), interval);
        assert_eq!(Arc::strong_count(&store), 1);

        advance_until(|| source.fetches() >= 1).await;
        drop(store);

        tokio::time::timeout(interval * 2, task)
            .await
            .expect("refresh task still running")
            .unwrap();
    }
}
