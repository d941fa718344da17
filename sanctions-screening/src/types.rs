use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction-level screening verdict
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningStatus {
    Clear,
    Pending,
    Flagged,
}

impl ScreeningStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ScreeningStatus::Clear => "clear",
            ScreeningStatus::Pending => "pending",
            ScreeningStatus::Flagged => "flagged",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Individual,
    Organization,
    Unknown,
}

impl EntityType {
    /// Map a list's party-type label
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "individual" => EntityType::Individual,
            "entity" | "organization" | "organisation" => EntityType::Organization,
            _ => EntityType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PartySide {
    Sender,
    Receiver,
}

/// Why a name is being screened. Carried for reporting only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IdentityRole {
    Principal,
    Ceo,
    Founder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningQuery {
    pub name: String,
    pub side: Option<PartySide>,
    pub role: Option<IdentityRole>,
}

impl ScreeningQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            side: None,
            role: None,
        }
    }

    pub fn tagged(name: impl Into<String>, side: PartySide, role: IdentityRole) -> Self {
        Self {
            name: name.into(),
            side: Some(side),
            role: Some(role),
        }
    }
}

/// Which field produced a match. Only names are matched today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Name,
    Address,
    Id,
    Other,
}

/// Fields copied from the best-matching watchlist entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchDetails {
    pub entry_id: Option<String>,
    pub entity_type: EntityType,
    pub party_type: Option<String>,
    pub programs: Vec<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub query: String,
    pub side: Option<PartySide>,
    pub role: Option<IdentityRole>,
    pub is_match: bool,
    pub match_score: f64, // 0.0-1.0
    pub matched_name: Option<String>,
    pub match_type: MatchType,
    pub details: Option<MatchDetails>,
}

impl MatchResult {
    /// Result for a query that found nothing
    pub fn no_match(query: &ScreeningQuery) -> Self {
        Self {
            query: query.name.clone(),
            side: query.side,
            role: query.role,
            is_match: false,
            match_score: 0.0,
            matched_name: None,
            match_type: MatchType::Name,
            details: None,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.match_score == 1.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionScreening {
    pub screening_id: Uuid,
    pub results: Vec<MatchResult>,
    pub status: ScreeningStatus,
    pub screened_at: DateTime<Utc>,
}

/// A person or organization tied to a party
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssociatedIdentity {
    pub role: IdentityRole,
    pub name: String,
    pub ownership_percentage: Option<f64>,
}

impl AssociatedIdentity {
    pub fn ceo(name: impl Into<String>) -> Self {
        Self {
            role: IdentityRole::Ceo,
            name: name.into(),
            ownership_percentage: None,
        }
    }

    pub fn founder(name: impl Into<String>, ownership_percentage: Option<f64>) -> Self {
        Self {
            role: IdentityRole::Founder,
            name: name.into(),
            ownership_percentage,
        }
    }
}

/// One side of a transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Party {
    pub name: String,
    #[serde(default)]
    pub associates: Vec<AssociatedIdentity>,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            associates: Vec::new(),
        }
    }

    pub fn with_associate(mut self, associate: AssociatedIdentity) -> Self {
        self.associates.push(associate);
        self
    }
}

/// Every party a transaction names
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionParties {
    pub sender: Party,
    pub receiver: Party,
}

impl TransactionParties {
    pub fn new(sender: Party, receiver: Party) -> Self {
        Self { sender, receiver }
    }

    /// The complete identity set to screen, blank names skipped
    pub fn identities(&self) -> Vec<ScreeningQuery> {
        let mut queries = Vec::new();
        for (side, party) in [
            (PartySide::Sender, &self.sender),
            (PartySide::Receiver, &self.receiver),
        ] {
            if !party.name.trim().is_empty() {
                queries.push(ScreeningQuery::tagged(&party.name, side, IdentityRole::Principal));
            }
            for associate in &party.associates {
                if !associate.name.trim().is_empty() {
                    queries.push(ScreeningQuery::tagged(&associate.name, side, associate.role));
                }
            }
        }
        queries
    }
}
