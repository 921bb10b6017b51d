use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EmptyCaller;

/// Identity of whoever submitted a call
///
/// The ledger never looks inside the value; it only uses it as the key for
/// per-caller borrow flags and as the borrower recorded in history. Any
/// opaque string works, an account address being the usual choice.
///
/// Surrounding whitespace is never part of an identity. Identities read from
/// outside the process (command line, environment, config and state files)
/// go through [`Caller::parse`] and must not be blank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Caller(String);

impl Caller {
    /// Wrap a known identity, trimming surrounding whitespace
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into().trim().to_owned())
    }

    /// Read an identity supplied from outside
    ///
    /// # Errors
    ///
    /// Returns [`EmptyCaller`] if nothing is left after trimming.
    pub fn parse(identity: &str) -> Result<Self, EmptyCaller> {
        let caller = Self::new(identity);
        if caller.0.is_empty() { Err(EmptyCaller) } else { Ok(caller) }
    }

    /// The raw identity string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Caller {
    type Err = EmptyCaller;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Caller {
    type Error = EmptyCaller;

    fn try_from(identity: String) -> Result<Self, Self::Error> {
        Self::parse(&identity)
    }
}

impl From<Caller> for String {
    fn from(caller: Caller) -> Self {
        caller.0
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
