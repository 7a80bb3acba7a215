use std::fmt;

use shared::uri::PetUri;

/// Short, user-facing outcome of a store action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PetSaved(PetUri),
    PetUpdated,
    SaveFailed,
    PetDeleted,
    DeleteFailed,
    PetsDeleted(u64),
    DeleteAllFailed,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::SaveFailed | Notice::DeleteFailed | Notice::DeleteAllFailed
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PetSaved(uri) => write!(f, "Pet saved {uri}"),
            Notice::PetUpdated => f.write_str("Pet updated"),
            Notice::SaveFailed => f.write_str("Error saving pet"),
            Notice::PetDeleted => f.write_str("Pet deleted"),
            Notice::DeleteFailed => f.write_str("Error deleting pet"),
            Notice::PetsDeleted(count) => write!(f, "Pets deleted {count}"),
            Notice::DeleteAllFailed => f.write_str("Error deleting pets"),
        }
    }
}

#[cfg(test)]
#[path = "tests/notice_tests.rs"]
mod tests;
