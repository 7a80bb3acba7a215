//! Resource addressing for pets: `content://<authority>/pets[/<id>]`.

use std::{fmt, str::FromStr};

use crate::{
    domain::{PetId, Selection},
    error::DomainError,
};

pub const CONTENT_SCHEME: &str = "content";
pub const CONTENT_AUTHORITY: &str = "com.example.android.pets";
pub const PATH_PETS: &str = "pets";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PetUri {
    /// The whole `pets` collection.
    Collection,
    Item(PetId),
}

impl PetUri {
    pub fn with_appended_id(id: PetId) -> Self {
        PetUri::Item(id)
    }

    pub fn id(&self) -> Option<PetId> {
        match self {
            PetUri::Collection => None,
            PetUri::Item(id) => Some(*id),
        }
    }
}

impl fmt::Display for PetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CONTENT_SCHEME}://{CONTENT_AUTHORITY}/{PATH_PETS}")?;
        if let PetUri::Item(id) = self {
            write!(f, "/{}", id.0)?;
        }
        Ok(())
    }
}

impl FromStr for PetUri {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::MalformedUri(raw.to_string());
        let rest = raw
            .trim()
            .strip_prefix(CONTENT_SCHEME)
            .and_then(|rest| rest.strip_prefix("://"))
            .and_then(|rest| rest.strip_prefix(CONTENT_AUTHORITY))
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_prefix(PATH_PETS))
            .ok_or_else(malformed)?;

        match rest.trim_end_matches('/') {
            "" => Ok(PetUri::Collection),
            tail => {
                let id = tail
                    .strip_prefix('/')
                    .and_then(|id| id.parse::<i64>().ok())
                    .filter(|id| *id > 0)
                    .ok_or_else(malformed)?;
                Ok(PetUri::Item(PetId(id)))
            }
        }
    }
}

impl From<PetUri> for Selection {
    fn from(uri: PetUri) -> Self {
        match uri {
            PetUri::Collection => Selection::All,
            PetUri::Item(id) => Selection::Id(id),
        }
    }
}

impl From<Selection> for PetUri {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => PetUri::Collection,
            Selection::Id(id) => PetUri::Item(id),
        }
    }
}
