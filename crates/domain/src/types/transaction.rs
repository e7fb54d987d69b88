//! Transaction lifecycle types

use std::fmt;

/// Lifecycle of a server-side transaction handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    /// Committed and RolledBack admit no further transitions
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        })
    }
}

/// Sub-operation discriminator sent as the `action` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionAction {
    Get,
    Add,
    Delete,
    Size,
    Query,
    Update,
    Commit,
}

impl TransactionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Add => "ADD",
            Self::Delete => "DELETE",
            Self::Size => "SIZE",
            Self::Query => "QUERY",
            Self::Update => "UPDATE",
            Self::Commit => "COMMIT",
        }
    }

    /// Read-only actions use the read timeout
    pub fn is_read(self) -> bool {
        matches!(self, Self::Get | Self::Size | Self::Query)
    }
}

impl fmt::Display for TransactionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Isolation levels accepted when a transaction is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    None,
    ReadUncommitted,
    ReadCommitted,
    SnapshotRead,
    Snapshot,
    Serializable,
}

impl IsolationLevel {
    /// IRI sent in the `isolation-level` parameter
    pub fn as_iri(self) -> &'static str {
        match self {
            Self::None => "http://www.openrdf.org/schema/sesame#NONE",
            Self::ReadUncommitted => "http://www.openrdf.org/schema/sesame#READ_UNCOMMITTED",
            Self::ReadCommitted => "http://www.openrdf.org/schema/sesame#READ_COMMITTED",
            Self::SnapshotRead => "http://www.openrdf.org/schema/sesame#SNAPSHOT_READ",
            Self::Snapshot => "http://www.openrdf.org/schema/sesame#SNAPSHOT",
            Self::Serializable => "http://www.openrdf.org/schema/sesame#SERIALIZABLE",
        }
    }
}
