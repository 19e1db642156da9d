use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const MAX_NAME_LEN: usize = 32;
const MAX_DOMAIN_LEN: usize = 255;

/// Ledger account identity in `name@domain` form, e.g. `relay@notary`.
///
/// The account is what the ledger node checks block-read permission against.
/// Names are lowercase alphanumerics and underscores; domains are dot-separated
/// labels of the same alphabet plus `-`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    name: String,
    domain: String,
}

impl AccountId {
    pub fn new(name: &str, domain: &str) -> Result<Self, TypeError> {
        let id = format!("{name}@{domain}");
        validate_name(&id, name)?;
        validate_domain(&id, domain)?;
        Ok(Self {
            name: name.to_string(),
            domain: domain.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

fn validate_name(id: &str, name: &str) -> Result<(), TypeError> {
    let invalid = |reason| TypeError::InvalidAccountId {
        id: id.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty account name"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("account name longer than 32 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    {
        return Err(invalid("account name must match [a-z0-9_]"));
    }
    Ok(())
}

fn validate_domain(id: &str, domain: &str) -> Result<(), TypeError> {
    let invalid = |reason| TypeError::InvalidAccountId {
        id: id.to_string(),
        reason,
    };
    if domain.is_empty() {
        return Err(invalid("empty domain"));
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(invalid("domain longer than 255 characters"));
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(invalid("empty domain label"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("domain label may not start or end with '-'"));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
        {
            return Err(invalid("domain must match [a-z0-9_-.]"));
        }
    }
    Ok(())
}

impl FromStr for AccountId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, domain) = s.split_once('@').ok_or_else(|| TypeError::InvalidAccountId {
            id: s.to_string(),
            reason: "missing '@'",
        })?;
        Self::new(name, domain)
    }
}

impl TryFrom<String> for AccountId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({}@{})", self.name, self.domain)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.domain)
    }
}
