//! Lifecycle operation and planned change types

use serde::{Deserialize, Serialize};

/// Lifecycle operation of a resource handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "creating"),
            Operation::Read => write!(f, "reading"),
            Operation::Update => write!(f, "updating"),
            Operation::Delete => write!(f, "deleting"),
        }
    }
}

/// Change required to move a resource from its prior config to a desired one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// No changes needed
    NoOp,
    /// Update the resource in place
    Update,
    /// A field that cannot be updated changed; delete and create again
    Replace,
}

impl Change {
    /// Combine two field-level decisions, keeping the stronger one
    pub fn max(self, other: Change) -> Change {
        match (self, other) {
            (Change::Replace, _) | (_, Change::Replace) => Change::Replace,
            (Change::Update, _) | (_, Change::Update) => Change::Update,
            _ => Change::NoOp,
        }
    }

    /// `Update` when the values differ, `NoOp` otherwise
    pub fn when_changed<T: PartialEq + ?Sized>(prior: &T, desired: &T) -> Change {
        if prior == desired {
            Change::NoOp
        } else {
            Change::Update
        }
    }

    /// `Replace` when the values differ, `NoOp` otherwise
    pub fn replace_when_changed<T: PartialEq + ?Sized>(prior: &T, desired: &T) -> Change {
        if prior == desired {
            Change::NoOp
        } else {
            Change::Replace
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::NoOp => write!(f, "no-op"),
            Change::Update => write!(f, "update"),
            Change::Replace => write!(f, "replace"),
        }
    }
}
