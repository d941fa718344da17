//! Asynchronous screening runs per transaction
//!
//! Each run screens a transaction's complete identity set as one task and
//! applies the derived status only when the whole batch is done. A reviewer
//! may override the status by hand; the override holds until a run submitted
//! after it completes. Runs for transactions removed in the meantime, or
//! superseded by a newer run, are dropped without touching any status.

use crate::engine::ScreeningEngine;
use crate::error::{Error, Result};
use crate::types::{ScreeningQuery, ScreeningStatus, TransactionParties, TransactionScreening};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualOverride {
    pub status: ScreeningStatus,
    pub reviewer: String,
    pub note: Option<String>,
    pub overridden_at: DateTime<Utc>,
    // Latest run submitted when the override was made
    #[serde(skip)]
    run: u64,
}

/// Screening state of one transaction
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub status: ScreeningStatus,
    pub in_flight: bool,
    pub last_screening: Option<TransactionScreening>,
    pub manual_override: Option<ManualOverride>,
    run: u64,
    // Restored when the in-flight run is cancelled
    status_before_run: ScreeningStatus,
}

impl TransactionRecord {
    fn new() -> Self {
        Self {
            status: ScreeningStatus::Pending,
            in_flight: false,
            last_screening: None,
            manual_override: None,
            run: 0,
            status_before_run: ScreeningStatus::Pending,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum ScreeningOutcome {
    /// The derived status was applied
    Applied(TransactionScreening),
    /// Results recorded, but a manual override kept its status
    Overridden {
        screening: TransactionScreening,
        status: ScreeningStatus,
    },
    /// The transaction was removed or a newer run superseded this one
    Discarded,
    /// The run was cancelled before it finished
    Cancelled,
}

/// Completion event and cancellation hook of a submitted run
pub struct ScreeningHandle {
    transaction_id: Uuid,
    run: u64,
    completion: oneshot::Receiver<ScreeningOutcome>,
    abort: AbortHandle,
    transactions: Arc<DashMap<Uuid, TransactionRecord>>,
}

impl ScreeningHandle {
    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    /// Abort the run. Nothing it computed is applied and the status it
    /// replaced is restored, unless a reviewer has set one since.
    pub fn cancel(&self) {
        self.abort.abort();
        if let Some(mut record) = self.transactions.get_mut(&self.transaction_id) {
            if record.run == self.run && record.in_flight {
                record.in_flight = false;
                if record.manual_override.is_none() {
                    record.status = record.status_before_run;
                }
            }
        }
        debug!("Cancelled screening run {} of {}", self.run, self.transaction_id);
    }

    /// Wait for the run to finish
    pub async fn wait(self) -> ScreeningOutcome {
        self.completion.await.unwrap_or(ScreeningOutcome::Cancelled)
    }
}

/// ScreeningCoordinator tracks screening status per transaction
pub struct ScreeningCoordinator {
    engine: ScreeningEngine,
    transactions: Arc<DashMap<Uuid, TransactionRecord>>,
}

impl ScreeningCoordinator {
    pub fn new(engine: ScreeningEngine) -> Self {
        Self {
            engine,
            transactions: Arc::new(DashMap::new()),
        }
    }

    pub fn engine(&self) -> &ScreeningEngine {
        &self.engine
    }

    /// Screen every party of a transaction
    pub fn submit_parties(&self, transaction_id: Uuid, parties: &TransactionParties) -> ScreeningHandle {
        self.submit(transaction_id, parties.identities())
    }

    /// Start a full screening run for `transaction_id`
    pub fn submit(&self, transaction_id: Uuid, identities: Vec<ScreeningQuery>) -> ScreeningHandle {
        let run = {
            let mut record = self
                .transactions
                .entry(transaction_id)
                .or_insert_with(TransactionRecord::new);
            record.run += 1;
            if !record.in_flight {
                record.status_before_run = record.status;
            }
            record.in_flight = true;
            if record.manual_override.is_none() {
                record.status = ScreeningStatus::Pending;
            }
            record.run
        };

        let (sender, completion) = oneshot::channel();
        let engine = self.engine.clone();
        let transactions = Arc::clone(&self.transactions);

        let task = tokio::spawn(async move {
            let screening = engine.screen_transaction(identities).await;
            let outcome = Self::apply(&transactions, transaction_id, run, screening);
            // The submitter may have dropped its handle
            let _ = sender.send(outcome);
        });

        debug!("Submitted screening run {} for {}", run, transaction_id);
        ScreeningHandle {
            transaction_id,
            run,
            completion,
            abort: task.abort_handle(),
            transactions: Arc::clone(&self.transactions),
        }
    }

    fn apply(
        transactions: &DashMap<Uuid, TransactionRecord>,
        transaction_id: Uuid,
        run: u64,
        screening: TransactionScreening,
    ) -> ScreeningOutcome {
        let Some(mut record) = transactions.get_mut(&transaction_id) else {
            info!("Transaction {} removed during screening, results discarded", transaction_id);
            return ScreeningOutcome::Discarded;
        };

        if record.run != run {
            debug!(
                "Screening run {} of {} superseded by run {}",
                run, transaction_id, record.run
            );
            return ScreeningOutcome::Discarded;
        }

        record.in_flight = false;
        record.last_screening = Some(screening.clone());

        match record.manual_override.clone() {
            Some(manual) if manual.run >= run => {
                info!(
                    "Transaction {} screened as {}, manual override {} by {} kept",
                    transaction_id,
                    screening.status.as_str(),
                    manual.status.as_str(),
                    manual.reviewer
                );
                record.status = manual.status;
                ScreeningOutcome::Overridden {
                    screening,
                    status: manual.status,
                }
            }
            _ => {
                record.manual_override = None;
                record.status = screening.status;
                if screening.status == ScreeningStatus::Flagged {
                    warn!("Transaction {} FLAGGED by sanctions screening", transaction_id);
                } else {
                    info!("Transaction {} screened as {}", transaction_id, screening.status.as_str());
                }
                ScreeningOutcome::Applied(screening)
            }
        }
    }

    /// Set a transaction's status by hand
    pub fn override_status(
        &self,
        transaction_id: Uuid,
        status: ScreeningStatus,
        reviewer: impl Into<String>,
        note: Option<String>,
    ) -> Result<()> {
        let mut record = self
            .transactions
            .get_mut(&transaction_id)
            .ok_or(Error::UnknownTransaction(transaction_id))?;

        let reviewer = reviewer.into();
        info!(
            "Transaction {} manually set to {} by {}",
            transaction_id,
            status.as_str(),
            reviewer
        );

        record.status = status;
        record.manual_override = Some(ManualOverride {
            status,
            reviewer,
            note,
            overridden_at: Utc::now(),
            run: record.run,
        });
        Ok(())
    }

    /// Forget a transaction. Runs still in flight for it are discarded.
    pub fn remove(&self, transaction_id: Uuid) -> Option<TransactionRecord> {
        self.transactions.remove(&transaction_id).map(|(_, record)| record)
    }

    pub fn status(&self, transaction_id: Uuid) -> Option<ScreeningStatus> {
        self.transactions.get(&transaction_id).map(|r| r.status)
    }

    pub fn record(&self, transaction_id: Uuid) -> Option<TransactionRecord> {
        self.transactions.get(&transaction_id).map(|r| r.clone())
    }

    /// Number of tracked transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
