use crate::aggregator::derive_status;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::similarity::{Phrase, SimilarityScorer};
use crate::types::{
    MatchDetails, MatchResult, MatchType, ScreeningQuery, TransactionParties, TransactionScreening,
};
use crate::watchlist::{Watchlist, WatchlistEntry, WatchlistStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// ScreeningEngine finds the best watchlist match for a name
#[derive(Clone)]
pub struct ScreeningEngine {
    store: Arc<WatchlistStore>,
    scorer: SimilarityScorer,
}

impl ScreeningEngine {
    pub fn new(store: Arc<WatchlistStore>, scorer: SimilarityScorer) -> Self {
        Self { store, scorer }
    }

    /// Build the store, run the initial load and start periodic refreshes
    /// as configured. A failed initial load is returned to the caller.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(WatchlistStore::new(config.watchlist.reject_empty));

        match config.watchlist.source()? {
            Some(source) => {
                store.load(source.as_ref()).await?;
                if let Some(interval) = config.watchlist.refresh_interval() {
                    info!("Refreshing watchlist every {:?}", interval);
                    store.spawn_refresh(source, interval);
                }
            }
            None => warn!("No watchlist source configured, screening reports no matches"),
        }

        Ok(Self::new(store, config.matching.scorer()))
    }

    pub fn store(&self) -> &Arc<WatchlistStore> {
        &self.store
    }

    pub fn scorer(&self) -> SimilarityScorer {
        self.scorer
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Screen one name. Before any watchlist is loaded this reports no match.
    pub fn check_name(&self, text: &str) -> MatchResult {
        self.check(&ScreeningQuery::new(text))
    }

    /// Like [`check_name`](Self::check_name) but fails before the first load
    pub fn check_name_strict(&self, text: &str) -> Result<MatchResult> {
        let watchlist = self.store.snapshot().ok_or(Error::NotInitialized)?;
        Ok(self.check_against(&watchlist, &ScreeningQuery::new(text)))
    }

    pub fn check(&self, query: &ScreeningQuery) -> MatchResult {
        match self.store.snapshot() {
            Some(watchlist) => self.check_against(&watchlist, query),
            None => {
                debug!("Watchlist not loaded, no match for {}", query.name);
                MatchResult::no_match(query)
            }
        }
    }

    /// Scan `watchlist` for the entry scoring highest against `query`.
    /// Ties keep the earliest entry.
    pub fn check_against(&self, watchlist: &Watchlist, query: &ScreeningQuery) -> MatchResult {
        let query_pairs = Phrase::pairs_of(&query.name);
        if query_pairs.is_empty() {
            return MatchResult::no_match(query);
        }

        let mut highest_score = 0.0;
        let mut matched: Option<&WatchlistEntry> = None;

        for entry in watchlist.iter() {
            let score = self.scorer.score_phrases(&query_pairs, entry.phrases());
            if score > highest_score {
                highest_score = score;
                matched = Some(entry);
                if self.scorer.is_match(score) {
                    debug!("Candidate match: {} ~ {} ({:.3})", query.name, entry.full_name, score);
                }
            }
        }

        let Some(entry) = matched else {
            return MatchResult::no_match(query);
        };

        let is_match = self.scorer.is_match(highest_score);
        if is_match {
            info!(
                "Sanctions name match: {} ~ {} (score: {:.3})",
                query.name, entry.full_name, highest_score
            );
        }

        MatchResult {
            query: query.name.clone(),
            side: query.side,
            role: query.role,
            is_match,
            match_score: highest_score,
            matched_name: Some(entry.full_name.clone()),
            match_type: MatchType::Name,
            details: Some(MatchDetails {
                entry_id: entry.id.clone(),
                entity_type: entry.entity_type,
                party_type: entry.party_type.clone(),
                programs: entry.programs.clone(),
                remarks: entry.remarks.clone(),
            }),
        }
    }

    /// Screen every party a transaction names
    pub async fn screen_parties(&self, parties: &TransactionParties) -> TransactionScreening {
        self.screen_transaction(parties.identities()).await
    }

    /// Screen a transaction's complete identity set and derive its status.
    ///
    /// All names are checked against the same watchlist snapshot, in
    /// parallel, and the status is derived only once every check is done.
    /// Without a loaded watchlist no check runs and the status is pending.
    pub async fn screen_transaction(&self, identities: Vec<ScreeningQuery>) -> TransactionScreening {
        let screening_id = Uuid::new_v4();

        let Some(watchlist) = self.store.snapshot() else {
            warn!("Watchlist not loaded, transaction screening {} not run", screening_id);
            return Self::finish(screening_id, Vec::new());
        };

        let mut tasks = JoinSet::new();
        for (index, query) in identities.iter().cloned().enumerate() {
            let engine = self.clone();
            let watchlist = Arc::clone(&watchlist);
            tasks.spawn_blocking(move || (index, engine.check_against(&watchlist, &query)));
        }

        let mut slots: Vec<Option<MatchResult>> = vec![None; identities.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!("Name check task failed in screening {}: {}", screening_id, e),
            }
        }

        // Re-run anything whose task did not report back
        let results = slots
            .into_iter()
            .zip(&identities)
            .map(|(slot, query)| slot.unwrap_or_else(|| self.check_against(&watchlist, query)))
            .collect();

        Self::finish(screening_id, results)
    }

    fn finish(screening_id: Uuid, results: Vec<MatchResult>) -> TransactionScreening {
        let status = derive_status(&results);
        info!(
            "Screening {} completed: {} names, status {}",
            screening_id,
            results.len(),
            status.as_str()
        );

        TransactionScreening {
            screening_id,
            results,
            status,
            screened_at: Utc::now(),
        }
    }
}
