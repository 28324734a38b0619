use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Most parents a member may reference.
pub const MAX_PARENTS: usize = 2;

/// Stable identifier of a family member.
///
/// The persistence layer hands out integer ids, but hosts that mint their own
/// ids may send strings, so both are accepted. Integer-looking ids compare
/// numerically, which keeps family keys such as `"3-10"` in the order a reader
/// expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "IdRepr")]
pub struct MemberId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Text(String),
}

impl From<IdRepr> for MemberId {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Int(value) => Self(value.to_string()),
            IdRepr::Text(value) => Self(value.trim().to_string()),
        }
    }
}

impl MemberId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(num) => num.as_i64().map(|n| Self(n.to_string())),
            serde_json::Value::String(text) if !text.trim().is_empty() => {
                Some(Self(text.trim().to_string()))
            }
            _ => None,
        }
    }
}

impl From<i64> for MemberId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for MemberId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for MemberId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for MemberId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for MemberId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.numeric() {
            Some(value) if value.to_string() == self.0 => serializer.serialize_i64(value),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

/// The parent field as it arrives from storage.
///
/// JSONB columns round-trip as arrays, but older rows were written with the
/// array already serialised to text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum RawParents {
    Ids(Vec<serde_json::Value>),
    Encoded(String),
    #[default]
    Missing,
    Other(serde_json::Value),
}

impl RawParents {
    /// Decodes into an id list. Malformed input yields no parents.
    pub fn decode(&self) -> Vec<MemberId> {
        match self {
            RawParents::Ids(values) => values.iter().filter_map(MemberId::from_json).collect(),
            RawParents::Encoded(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Vec::new();
                }
                match serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
                    Ok(values) => values.iter().filter_map(MemberId::from_json).collect(),
                    Err(err) => {
                        tracing::debug!(raw = trimmed, %err, "unreadable parent list, treating as none");
                        Vec::new()
                    }
                }
            }
            RawParents::Missing => Vec::new(),
            RawParents::Other(value) => {
                tracing::debug!(raw = %value, "unexpected parent field shape, treating as none");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum RawGeneration {
    Int(i64),
    Float(f64),
    Text(String),
    #[default]
    Missing,
}

impl RawGeneration {
    fn resolve(&self) -> i64 {
        match self {
            RawGeneration::Int(value) => *value,
            RawGeneration::Float(value) if value.is_finite() => value.round() as i64,
            RawGeneration::Text(text) => text.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// One row as returned by the persistence collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: MemberId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub years: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    generation: RawGeneration,
    #[serde(default)]
    pub parents: RawParents,
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
}

impl MemberRecord {
    pub fn normalize(self) -> Member {
        let parents = normalize_parents(&self.id, self.parents.decode());
        Member {
            generation: self.generation.resolve(),
            id: self.id,
            name: self.name,
            relation: self.relation,
            years: self.years,
            bio: self.bio,
            parents,
            image_url: self.image_url.filter(|url| !url.trim().is_empty()),
        }
    }
}

/// A family member in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub relation: String,
    pub years: Option<String>,
    pub bio: Option<String>,
    pub generation: i64,
    /// Zero, one or two distinct ids, never including the member itself.
    pub parents: Vec<MemberId>,
    pub image_url: Option<String>,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>, generation: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            relation: String::new(),
            years: None,
            bio: None,
            generation,
            parents: Vec::new(),
            image_url: None,
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    pub fn with_parents<I, P>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<MemberId>,
    {
        let ids = parents.into_iter().map(Into::into).collect();
        self.parents = normalize_parents(&self.id, ids);
        self
    }

    pub fn has_parents(&self) -> bool {
        !self.parents.is_empty()
    }
}

fn normalize_parents(own: &MemberId, ids: Vec<MemberId>) -> Vec<MemberId> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(MAX_PARENTS);
    for id in ids {
        if &id == own {
            tracing::debug!(member = %own, "member lists itself as a parent, ignoring");
            continue;
        }
        if seen.insert(id.clone()) {
            out.push(id);
        }
        if out.len() == MAX_PARENTS {
            break;
        }
    }
    out
}

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("failed to read member file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid member JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate member id {0}")]
    DuplicateId(MemberId),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MembersFile {
    List(Vec<MemberRecord>),
    Wrapped { members: Vec<MemberRecord> },
}

/// Parses a member list, either a bare array or `{ "members": [...] }`.
pub fn parse_members(input: &str) -> Result<Vec<Member>, MemberError> {
    let records = match serde_json::from_str::<MembersFile>(input)? {
        MembersFile::List(records) => records,
        MembersFile::Wrapped { members } => members,
    };
    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.clone()) {
            return Err(MemberError::DuplicateId(record.id));
        }
        members.push(record.normalize());
    }
    Ok(members)
}

pub fn load_members(path: &Path) -> Result<Vec<Member>, MemberError> {
    let contents = std::fs::read_to_string(path)?;
    parse_members(&contents)
}
