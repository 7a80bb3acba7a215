use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(PetId);

impl std::fmt::Display for PetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shown in list rows when a pet has no breed recorded.
pub const UNKNOWN_BREED: &str = "Unknown breed";

/// Gender as persisted in the `gender` column: 0 unknown, 1 male, 2 female.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Unknown, Gender::Male, Gender::Female];

    pub fn code(self) -> i64 {
        match self {
            Gender::Unknown => 0,
            Gender::Male => 1,
            Gender::Female => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Gender::Unknown),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Female),
            other => Err(DomainError::UnknownGender(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Unknown => "Unknown",
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = DomainError;

    /// Accepts either the numeric code or the label, case-insensitively.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<i64>() {
            return Gender::from_code(code);
        }
        Gender::ALL
            .into_iter()
            .find(|gender| gender.label().eq_ignore_ascii_case(raw))
            .ok_or_else(|| DomainError::UnknownGenderLabel(raw.to_string()))
    }
}

/// The editable attributes of a pet, everything except its id.
///
/// Optional text is stored as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetFields {
    pub name: String,
    pub breed: String,
    pub gender: Gender,
    pub weight: u32,
}

impl PetFields {
    pub fn new(name: impl Into<String>, breed: impl Into<String>, gender: Gender, weight: u32) -> Self {
        Self {
            name: name.into(),
            breed: breed.into(),
            gender,
            weight,
        }
    }

    /// True when every field still holds its default.
    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.breed.is_empty() && self.weight == 0 && self.gender == Gender::Unknown
    }

    /// Weight as written to the store.
    pub fn weight_column(&self) -> i64 {
        i64::from(self.weight)
    }
}

pub fn weight_from_column(raw: i64) -> Result<u32, DomainError> {
    u32::try_from(raw).map_err(|_| DomainError::WeightOutOfRange(raw))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    #[serde(flatten)]
    pub fields: PetFields,
}

impl Pet {
    pub fn display_breed(&self) -> &str {
        display_breed(&self.fields.breed)
    }
}

pub fn display_breed(breed: &str) -> &str {
    if breed.trim().is_empty() {
        UNKNOWN_BREED
    } else {
        breed
    }
}

/// Which rows a store operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Id(PetId),
}

/// Which columns a query reads back. `id` is always included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Full,
    /// `id`, `name` and `breed`: what a list row displays.
    Summary,
}

/// One row as returned by a query; columns outside the projection are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRow {
    pub id: PetId,
    pub name: String,
    pub breed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl PetRow {
    /// Full pet when the row was read with [`Projection::Full`].
    pub fn into_pet(self) -> Option<Pet> {
        Some(Pet {
            id: self.id,
            fields: PetFields {
                name: self.name,
                breed: self.breed,
                gender: self.gender?,
                weight: self.weight?,
            },
        })
    }
}

impl From<Pet> for PetRow {
    fn from(pet: Pet) -> Self {
        Self {
            id: pet.id,
            name: pet.fields.name,
            breed: pet.fields.breed,
            gender: Some(pet.fields.gender),
            weight: Some(pet.fields.weight),
        }
    }
}
