//! Sanctions watchlist screening
//!
//! Screens the parties named in a payment message against a sanctions
//! watchlist using bigram similarity and derives a transaction status.

#![forbid(unsafe_code)]

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod document;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod similarity;
pub mod source;
pub mod types;
pub mod watchlist;

pub use aggregator::derive_status;
pub use config::Config;
pub use coordinator::{ScreeningCoordinator, ScreeningHandle, ScreeningOutcome};
pub use document::{DocumentFormat, NamePart, NamePartKind, PartyRecord};
pub use engine::ScreeningEngine;
pub use error::{Error, LoadError, Result};
pub use similarity::{dice_score, name_score, SimilarityScorer, DEFAULT_MATCH_THRESHOLD};
pub use source::{FileSource, HttpSource, StaticSource, WatchlistSource};
pub use types::{
    AssociatedIdentity, EntityType, IdentityRole, MatchResult, Party, PartySide, ScreeningQuery,
    ScreeningStatus, TransactionParties, TransactionScreening,
};
pub use watchlist::{Watchlist, WatchlistEntry, WatchlistStore};
