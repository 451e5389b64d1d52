//! Create/edit workflow around a [`ScenarioForm`].

use common::{FormCommand, FormErrors, FormField, PreviewInput, PreviewSeries, Scenario, ScenarioForm, ScenarioId};
use compute::PreviewGenerator;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::ScenarioApi;
use crate::error::ClientError;
use crate::store::ScenarioStore;

pub const CREATE_FAILED: &str = "Failed to create scenario. Try again.";
pub const UPDATE_FAILED: &str = "Failed to update scenario. Try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ScenarioId),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Invalid scenario: {0}")]
    Invalid(FormErrors),

    #[error(transparent)]
    Remote(#[from] ClientError),
}

/// A form being filled in, either for a new scenario or for an existing one.
#[derive(Debug, Clone)]
pub struct FormSession {
    mode: FormMode,
    form: ScenarioForm,
    errors: FormErrors,
    preview: PreviewSeries,
}

impl FormSession {
    /// Empty form for a new scenario.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            form: ScenarioForm::default(),
            errors: FormErrors::new(),
            preview: PreviewSeries::default(),
        }
    }

    /// Form pre-filled with an existing scenario's values.
    pub fn edit(scenario: &Scenario) -> Self {
        Self {
            mode: FormMode::Edit(scenario.id.clone()),
            form: ScenarioForm::from(scenario),
            errors: FormErrors::new(),
            preview: PreviewSeries::default(),
        }
    }

    /// Fetches the scenario from the remote and opens it for editing.
    pub async fn open<A: ScenarioApi>(store: &ScenarioStore<A>, id: &ScenarioId) -> Result<Self, ClientError> {
        let scenario = store.fetch(id).await?;
        Ok(Self::edit(&scenario))
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn form(&self) -> &ScenarioForm {
        &self.form
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn preview(&self) -> &PreviewSeries {
        &self.preview
    }

    /// Applies an edit. A message recorded against the edited field goes away.
    pub fn apply(&mut self, command: FormCommand) {
        match &command {
            FormCommand::SetName(_) => {
                self.errors.remove(FormField::Name);
            }
            FormCommand::SetStart(_) | FormCommand::SetEnd(_) => {
                self.errors.remove(FormField::DateRange);
            }
            FormCommand::SetMultiplier(_) => {
                self.errors.remove(FormField::SalesMultiplier);
            }
            FormCommand::Toggle(field, _) => {
                self.errors.remove(field.form_field());
            }
            FormCommand::Load(_) | FormCommand::Reset => self.errors.clear(),
        }
        self.form.apply(command);
    }

    /// Regenerates the preview from the current dates and multiplier.
    pub fn refresh_preview(&mut self, generator: &PreviewGenerator) -> &PreviewSeries {
        self.preview = generator.generate_random(&PreviewInput::from(&self.form));
        &self.preview
    }

    /// Validates the form and saves it through the store.
    ///
    /// Invalid input never reaches the remote. A successful create resets
    /// the form; a successful edit keeps it.
    #[instrument(skip(self, store), fields(mode = ?self.mode))]
    pub async fn submit<A: ScenarioApi>(&mut self, store: &ScenarioStore<A>) -> Result<Scenario, SubmitError> {
        let draft = match self.form.validate() {
            Ok(draft) => draft,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(SubmitError::Invalid(errors));
            }
        };
        self.errors.clear();

        let result = match &self.mode {
            FormMode::Create => store.create(&draft).await,
            FormMode::Edit(id) => store.update(id, &draft).await,
        };

        match result {
            Ok(saved) => {
                info!("Scenario saved: id={}", saved.id);
                if self.mode == FormMode::Create {
                    debug!("Resetting form after create");
                    self.form = ScenarioForm::default();
                    self.preview = PreviewSeries::default();
                }
                Ok(saved)
            }
            Err(e) => {
                warn!("Scenario submission failed: {}", e);
                let message = match self.mode {
                    FormMode::Create => CREATE_FAILED,
                    FormMode::Edit(_) => UPDATE_FAILED,
                };
                self.errors.insert(FormField::Name, message);
                Err(SubmitError::Remote(e))
            }
        }
    }
}
