use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::names::validate_job_id;

/// Which rendition of a job's book a logical document holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    /// The PDF delivered to the customer.
    Customer,
    /// The print-ready interior sent to the print vendor.
    LuluInterior,
}

impl DocumentRole {
    /// Every role, in a stable order.
    pub const ALL: [DocumentRole; 2] = [DocumentRole::Customer, DocumentRole::LuluInterior];

    /// The role as it appears in object keys and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentRole::Customer => "customer",
            DocumentRole::LuluInterior => "lulu_interior",
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentRole {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(DocumentRole::Customer),
            "lulu_interior" => Ok(DocumentRole::LuluInterior),
            other => Err(TypeError::UnknownRole(other.to_string())),
        }
    }
}

/// A validated storefront job identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Validate and wrap a job id.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        validate_job_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JobId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A logical document: the ever-growing book for one job and role.
///
/// A logical document is never stored directly. It exists only as a chain of
/// immutable versions plus the pointer, manifest and lock objects that share
/// its [`stem`](DocumentId::stem).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId {
    pub role: DocumentRole,
    pub job_id: JobId,
}

impl DocumentId {
    pub fn new(role: DocumentRole, job_id: JobId) -> Self {
        Self { role, job_id }
    }

    /// Shared prefix of every object name for this document:
    /// `{role}_{jobId}`.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.role, self.job_id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.role, self.job_id)
    }
}
