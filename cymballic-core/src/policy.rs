//! Access policy documents and their reconciliation.
//!
//! Documents are modeled loosely enough that statements this tool did not
//! write survive a round trip unchanged: single-or-list fields keep their
//! shape and unknown statement keys are carried through verbatim.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Policy language version written on new documents.
pub const POLICY_VERSION: &str = "2012-10-17";

fn default_version() -> String {
    POLICY_VERSION.to_string()
}

/// A string-or-list field such as `Action` or `Resource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Statement principal: either a bare wildcard or a map such as
/// `{"AWS": [...]}` / `{"Service": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    Wildcard(String),
    Keyed(Map<String, Value>),
}

impl Principal {
    pub fn aws(arns: Vec<String>) -> Self {
        let mut map = Map::new();
        map.insert(
            "AWS".to_string(),
            Value::Array(arns.into_iter().map(Value::String).collect()),
        );
        Principal::Keyed(map)
    }

    pub fn service(name: &str) -> Self {
        let mut map = Map::new();
        map.insert("Service".to_string(), Value::String(name.to_string()));
        Principal::Keyed(map)
    }
}

/// A single grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Principal", default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    #[serde(rename = "Action", default, skip_serializing_if = "Option::is_none")]
    pub action: Option<OneOrMany>,
    #[serde(rename = "Resource", default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany>,
    /// Keys this tool does not interpret (`Condition`, `NotAction`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Statement {
    /// An `Allow` statement over the given actions and resources.
    pub fn allow(action: impl Into<OneOrMany>, resources: Vec<String>) -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal: None,
            action: Some(action.into()),
            resource: Some(OneOrMany::Many(resources)),
            extra: Map::new(),
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.resource.iter().flat_map(OneOrMany::iter)
    }

    /// Whether any resource belongs to `key`: a catalog database ARN ending in
    /// `:database/<key>`, or any resource containing `<key>` (bucket ARNs and
    /// names). An empty key matches nothing.
    pub fn references(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let database_suffix = format!(":database/{key}");
        self.resources()
            .any(|resource| resource.ends_with(&database_suffix) || resource.contains(key))
    }
}

/// A policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version", default = "default_version")]
    pub version: String,
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Statement", default, deserialize_with = "statements")]
    pub statement: Vec<Statement>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            id: None,
            statement: Vec::new(),
        }
    }
}

impl PolicyDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `Statement` may be a single object or a list.
fn statements<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Statements {
        One(Box<Statement>),
        Many(Vec<Statement>),
    }

    Ok(match Statements::deserialize(deserializer)? {
        Statements::One(statement) => vec![*statement],
        Statements::Many(statements) => statements,
    })
}

/// Drop every statement that references `key`, then append `new_statements`.
///
/// Starts from an empty document when there is no existing policy. The new
/// statements are appended as given, without deduplication among themselves.
pub fn reconcile(
    existing: Option<PolicyDocument>,
    key: &str,
    new_statements: Vec<Statement>,
) -> PolicyDocument {
    let mut document = existing.unwrap_or_default();
    document
        .statement
        .retain(|statement| !statement.references(key));
    document.statement.extend(new_statements);
    document
}
