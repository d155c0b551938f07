//! Declared data types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Type named in a DECLARE, parameter list or RETURNS clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    String,
    Integer,
    Char,
    Real,
    Boolean,
}

impl DeclaredType {
    pub const ALL: [DeclaredType; 5] = [
        DeclaredType::String,
        DeclaredType::Integer,
        DeclaredType::Char,
        DeclaredType::Real,
        DeclaredType::Boolean,
    ];

    /// Keyword spelling used in source text
    pub fn name(self) -> &'static str {
        match self {
            DeclaredType::String => "STRING",
            DeclaredType::Integer => "INTEGER",
            DeclaredType::Char => "CHAR",
            DeclaredType::Real => "REAL",
            DeclaredType::Boolean => "BOOLEAN",
        }
    }
}

impl std::fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeclaredType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeclaredType::ALL
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| format!("unknown data type: {s}"))
    }
}
