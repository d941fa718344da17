//! Watchlist source document
//!
//! A document enumerates parties, each with tagged name parts, sanctions
//! programs and an entity type. Two encodings carry the same field contract:
//! the XML export published by the list owner and a JSON array of
//! [`PartyRecord`] used as a parsed-list cache.

use crate::error::LoadError;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Encoding of a watchlist document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Xml,
    Json,
}

impl DocumentFormat {
    /// `.json` selects JSON, anything else is XML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Xml,
        }
    }
}

/// Role of a name part inside a party's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamePartKind {
    GivenName,
    Surname,
    WholeName,
    Other,
}

impl NamePartKind {
    /// Accepts `GivenName`, `given-name`, `given_name` and so on
    pub fn parse(tag: &str) -> Self {
        let folded: String = tag
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match folded.as_str() {
            "givenname" => NamePartKind::GivenName,
            "surname" => NamePartKind::Surname,
            "wholename" => NamePartKind::WholeName,
            _ => NamePartKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamePart {
    pub kind: NamePartKind,
    pub value: String,
}

impl NamePart {
    pub fn new(kind: NamePartKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// One party as described by the source document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub party_type: Option<String>,
    #[serde(default)]
    pub name_parts: Vec<NamePart>,
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

// XML export structures
#[derive(Debug, Deserialize)]
struct XmlDocument {
    #[serde(rename = "DistinctParty", default)]
    parties: Vec<XmlParty>,
}

#[derive(Debug, Deserialize)]
struct XmlParty {
    #[serde(rename = "@FixedRef", default)]
    fixed_ref: Option<String>,
    #[serde(rename = "PartyType", default)]
    party_type: Option<String>,
    #[serde(rename = "NamePart", default)]
    name_parts: Vec<XmlNamePart>,
    #[serde(rename = "SanctionsProgram", default)]
    programs: Vec<String>,
    #[serde(rename = "Remarks", default)]
    remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlNamePart {
    #[serde(rename = "NamePartType", default)]
    part_type: Option<String>,
    #[serde(rename = "NamePartValue", default)]
    value: Option<String>,
}

impl From<XmlParty> for PartyRecord {
    fn from(party: XmlParty) -> Self {
        let name_parts = party
            .name_parts
            .into_iter()
            .filter_map(|part| {
                let kind = part
                    .part_type
                    .as_deref()
                    .map(NamePartKind::parse)
                    .unwrap_or(NamePartKind::Other);
                part.value.map(|value| NamePart::new(kind, value))
            })
            .collect();

        PartyRecord {
            id: non_blank(party.fixed_ref),
            party_type: non_blank(party.party_type),
            name_parts,
            programs: party
                .programs
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            remarks: non_blank(party.remarks),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a document body into party records
pub fn parse_document(body: &str, format: DocumentFormat) -> Result<Vec<PartyRecord>, LoadError> {
    let records = match format {
        DocumentFormat::Xml => parse_xml(body)?,
        DocumentFormat::Json => parse_json(body)?,
    };
    debug!("Parsed {} party records ({:?}, {} bytes)", records.len(), format, body.len());
    Ok(records)
}

fn parse_xml(xml: &str) -> Result<Vec<PartyRecord>, LoadError> {
    let document: XmlDocument = from_str(xml).map_err(|e| {
        LoadError::MalformedDocument(format!("Failed to parse watchlist XML: {}", e))
    })?;

    Ok(document.parties.into_iter().map(PartyRecord::from).collect())
}

fn parse_json(json: &str) -> Result<Vec<PartyRecord>, LoadError> {
    serde_json::from_str(json).map_err(|e| {
        LoadError::MalformedDocument(format!("Failed to parse watchlist JSON: {}", e))
    })
}

/// Render party records in the JSON cache format
pub fn to_json(records: &[PartyRecord]) -> Result<String, crate::Error> {
    serde_json::to_string_pretty(records).map_err(|e| crate::Error::Serialization(e.to_string()))
}
