//! Add/edit form for a single pet.
//!
//! [`reduce`] is the whole state machine: it applies one message to an
//! [`EditorState`] and returns the effect the caller must carry out.
//! [`EditorController`] owns a state plus a repository and performs those
//! effects.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use shared::{
    domain::{Gender, Pet, PetFields, PetId, Projection, Selection},
    uri::PetUri,
};
use tracing::{debug, info, warn};

use crate::{catalog::EditorTarget, notice::Notice, PetRepository};

pub const ADD_TITLE: &str = "Add a Pet";
pub const EDIT_TITLE: &str = "Edit Pet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(PetId),
}

/// Raw form contents. Weight stays as typed until it is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorForm {
    pub name: String,
    pub breed: String,
    pub weight: String,
    pub gender: Gender,
}

impl EditorForm {
    pub fn from_pet(pet: &Pet) -> Self {
        Self {
            name: pet.fields.name.clone(),
            breed: pet.fields.breed.clone(),
            weight: pet.fields.weight.to_string(),
            gender: pet.fields.gender,
        }
    }

    pub fn to_fields(&self) -> PetFields {
        PetFields {
            name: self.name.trim().to_string(),
            breed: self.breed.trim().to_string(),
            gender: self.gender,
            weight: parse_weight(&self.weight),
        }
    }
}

/// Lenient weight parsing: anything that is not a non-negative integer counts as 0.
pub fn parse_weight(raw: &str) -> u32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    match raw.parse::<u32>() {
        Ok(weight) => weight,
        Err(error) => {
            warn!(raw, %error, "unparseable weight; saving 0");
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Name(String),
    Breed(String),
    Weight(String),
    Gender(Gender),
}

/// How the user tried to leave the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Back,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Discard,
    KeepEditing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMsg {
    Loaded(Pet),
    Edit(FieldEdit),
    NavigateAway(ExitKind),
    PromptAnswered(PromptChoice),
    Save,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEffect {
    None,
    Exit(ExitKind),
    /// Ask whether to throw away unsaved edits before leaving.
    ConfirmDiscard(ExitKind),
    /// Save requested on a blank form; nothing to write.
    Skip,
    Insert(PetFields),
    Update(PetId, PetFields),
    Delete(PetId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub mode: EditorMode,
    pub form: EditorForm,
    pub dirty: bool,
    /// Set while the discard prompt is showing.
    pub pending_exit: Option<ExitKind>,
}

impl EditorState {
    pub fn new(mode: EditorMode) -> Self {
        Self {
            mode,
            form: EditorForm::default(),
            dirty: false,
            pending_exit: None,
        }
    }
}

pub fn reduce(state: &mut EditorState, msg: EditorMsg) -> EditorEffect {
    match msg {
        EditorMsg::Loaded(pet) => {
            state.form = EditorForm::from_pet(&pet);
            EditorEffect::None
        }
        EditorMsg::Edit(edit) => {
            match edit {
                FieldEdit::Name(name) => state.form.name = name,
                FieldEdit::Breed(breed) => state.form.breed = breed,
                FieldEdit::Weight(weight) => state.form.weight = weight,
                FieldEdit::Gender(gender) => state.form.gender = gender,
            }
            state.dirty = true;
            EditorEffect::None
        }
        EditorMsg::NavigateAway(kind) => {
            if state.dirty {
                state.pending_exit = Some(kind);
                EditorEffect::ConfirmDiscard(kind)
            } else {
                EditorEffect::Exit(kind)
            }
        }
        EditorMsg::PromptAnswered(choice) => match (state.pending_exit.take(), choice) {
            (Some(kind), PromptChoice::Discard) => EditorEffect::Exit(kind),
            _ => EditorEffect::None,
        },
        EditorMsg::Save => {
            // Saving closes the session whatever the write does.
            state.dirty = false;
            state.pending_exit = None;
            let fields = state.form.to_fields();
            if fields.is_blank() {
                return EditorEffect::Skip;
            }
            match state.mode {
                EditorMode::Create => EditorEffect::Insert(fields),
                EditorMode::Edit(id) => EditorEffect::Update(id, fields),
            }
        }
        EditorMsg::Delete => match state.mode {
            EditorMode::Create => EditorEffect::None,
            EditorMode::Edit(id) => EditorEffect::Delete(id),
        },
    }
}

/// What the front end should do after a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Proceed(ExitKind),
    Prompt,
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Skipped,
    Inserted(PetId),
    Updated,
    Failed,
}

impl SaveOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SaveOutcome::Skipped => None,
            SaveOutcome::Inserted(id) => Some(Notice::PetSaved(PetUri::with_appended_id(*id))),
            SaveOutcome::Updated => Some(Notice::PetUpdated),
            SaveOutcome::Failed => Some(Notice::SaveFailed),
        }
    }
}

pub struct EditorController {
    repo: Arc<dyn PetRepository>,
    state: EditorState,
}

impl EditorController {
    /// Opens a blank form for `Create`, or loads the single pet behind `Edit`.
    pub async fn open(repo: Arc<dyn PetRepository>, target: EditorTarget) -> Result<Self> {
        let mut state = match target {
            EditorTarget::Create => EditorState::new(EditorMode::Create),
            EditorTarget::Edit(id) => EditorState::new(EditorMode::Edit(id)),
        };

        if let EditorTarget::Edit(id) = target {
            let pet = load_unique(repo.as_ref(), id).await?;
            reduce(&mut state, EditorMsg::Loaded(pet));
        }

        debug!(?target, "editor opened");
        Ok(Self { repo, state })
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn form(&self) -> &EditorForm {
        &self.state.form
    }

    pub fn mode(&self) -> EditorMode {
        self.state.mode
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty
    }

    pub fn title(&self) -> &'static str {
        match self.state.mode {
            EditorMode::Create => ADD_TITLE,
            EditorMode::Edit(_) => EDIT_TITLE,
        }
    }

    /// Delete only applies to a pet that already exists.
    pub fn can_delete(&self) -> bool {
        matches!(self.state.mode, EditorMode::Edit(_))
    }

    pub fn edit(&mut self, edit: FieldEdit) {
        reduce(&mut self.state, EditorMsg::Edit(edit));
    }

    pub fn navigate_away(&mut self, kind: ExitKind) -> ExitDecision {
        self.decide(EditorMsg::NavigateAway(kind))
    }

    pub fn answer_prompt(&mut self, choice: PromptChoice) -> ExitDecision {
        self.decide(EditorMsg::PromptAnswered(choice))
    }

    /// Writes the form and ends the editing session: the form is clean
    /// afterwards, so the next [`navigate_away`](Self::navigate_away) proceeds
    /// without a prompt even when nothing was written.
    pub async fn save(&mut self) -> SaveOutcome {
        match reduce(&mut self.state, EditorMsg::Save) {
            EditorEffect::Insert(fields) => match self.repo.insert(&fields).await {
                Ok(id) => {
                    info!(pet_id = id.0, "pet saved");
                    self.state.mode = EditorMode::Edit(id);
                    SaveOutcome::Inserted(id)
                }
                Err(error) => {
                    warn!(%error, "failed to insert pet");
                    SaveOutcome::Failed
                }
            },
            EditorEffect::Update(id, fields) => match self.repo.update(id, &fields).await {
                Ok(0) => {
                    warn!(pet_id = id.0, "update matched no pet");
                    SaveOutcome::Failed
                }
                Ok(_) => {
                    info!(pet_id = id.0, "pet updated");
                    SaveOutcome::Updated
                }
                Err(error) => {
                    warn!(pet_id = id.0, %error, "failed to update pet");
                    SaveOutcome::Failed
                }
            },
            _ => {
                debug!("blank form; skipping save");
                SaveOutcome::Skipped
            }
        }
    }

    /// Deletes the pet being edited. `None` in create mode.
    pub async fn delete(&mut self) -> Option<Notice> {
        let EditorEffect::Delete(id) = reduce(&mut self.state, EditorMsg::Delete) else {
            return None;
        };

        let notice = match self.repo.delete(Selection::Id(id)).await {
            Ok(count) if count > 0 => {
                info!(pet_id = id.0, "pet deleted");
                self.state.dirty = false;
                Notice::PetDeleted
            }
            Ok(_) => {
                warn!(pet_id = id.0, "delete matched no pet");
                Notice::DeleteFailed
            }
            Err(error) => {
                warn!(pet_id = id.0, %error, "failed to delete pet");
                Notice::DeleteFailed
            }
        };
        Some(notice)
    }

    fn decide(&mut self, msg: EditorMsg) -> ExitDecision {
        match reduce(&mut self.state, msg) {
            EditorEffect::Exit(kind) => ExitDecision::Proceed(kind),
            EditorEffect::ConfirmDiscard(_) => ExitDecision::Prompt,
            _ => ExitDecision::Stay,
        }
    }
}

async fn load_unique(repo: &dyn PetRepository, id: PetId) -> Result<Pet> {
    let mut rows = repo
        .query(Selection::Id(id), Projection::Full)
        .await
        .with_context(|| format!("failed to load pet {id}"))?;

    match rows.len() {
        0 => bail!("pet {id} not found"),
        1 => {}
        n => bail!("expected one pet for id {id}, found {n}"),
    }

    rows.pop()
        .and_then(|row| row.into_pet())
        .with_context(|| format!("pet {id} was loaded without all columns"))
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
