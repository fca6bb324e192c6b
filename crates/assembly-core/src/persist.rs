//! Two-phase plan save
//!
//! Phase 1 creates every drafted component and records the server id for each
//! temporary id. Phase 2 builds the step list from the sequencer order and
//! creates the plan. [`PlanPersistor::save_as_admin`] claims the save before
//! the session check so a second Save press cannot slip in while the check
//! is in flight. The two phases are not atomic: if phase 1 fails partway,
//! components created so far stay on the server and the error says how many.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::require_admin;
use crate::error::{AuthError, ServiceError, ValidationError};
use crate::model::{
    ActionType, ComponentId, ComponentInput, DraftComponent, PlanInput, PlanRef, ProductId,
    StepInput, TempId,
};
use crate::registry::ComponentRegistry;
use crate::sequencer::StepSequencer;
use crate::service::{DataService, SessionService};

/// Where a save currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SavePhase {
    #[default]
    Idle,
    Authorizing,
    SavingComponents {
        done: usize,
        total: usize,
    },
    SavingPlan,
    Done(PlanRef),
    Failed(String),
}

impl SavePhase {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SavePhase::Authorizing | SavePhase::SavingComponents { .. } | SavePhase::SavingPlan
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Failed to save component '{name}': {source}")]
    ComponentRejected { name: String, source: ServiceError },
    #[error("No valid id returned for component '{name}'")]
    MissingComponentId { name: String },
    #[error("Failed to create plan: {0}")]
    PlanRejected(ServiceError),
}

/// A sequenced step whose component was never created in phase 1
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No saved component for temporary id {0}")]
pub struct ReconciliationError(pub TempId);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A save is already in progress")]
    InProgress,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{source} ({created} component(s) were created before the failure)")]
    Persistence {
        created: usize,
        source: PersistenceError,
    },
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),
}

/// Everything a save needs, captured from the editor at the moment Save is pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPlan {
    pub product_id: ProductId,
    pub name: String,
    /// Components in registry order
    pub components: Vec<DraftComponent>,
    /// Step order as temporary ids
    pub order: Vec<TempId>,
}

impl DraftPlan {
    pub fn default_name(product_id: ProductId) -> String {
        format!("Assembly Plan for Product #{}", product_id)
    }

    /// Copy the current registry and sequencer; `name` falls back to
    /// [`DraftPlan::default_name`] when empty
    pub fn snapshot(
        product_id: ProductId,
        name: Option<&str>,
        registry: &ComponentRegistry,
        sequencer: &StepSequencer,
    ) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Self::default_name(product_id));
        Self {
            product_id,
            name,
            components: registry.components().to_vec(),
            order: sequencer.order().to_vec(),
        }
    }
}

/// Runs saves and publishes their phase to anyone holding a clone
#[derive(Debug, Clone, Default)]
pub struct PlanPersistor {
    phase: Arc<Mutex<SavePhase>>,
}

impl PlanPersistor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SavePhase {
        self.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    /// Return to `Idle` after a finished save; ignored while busy
    pub fn reset(&self) {
        let mut phase = self.lock();
        if !phase.is_busy() {
            *phase = SavePhase::Idle;
        }
    }

    /// Save `draft` through `service`
    ///
    /// Validation and re-entrancy failures leave the phase untouched. Any
    /// other outcome ends in `Done` or `Failed`.
    pub async fn save<S: DataService>(
        &self,
        service: &S,
        draft: DraftPlan,
    ) -> Result<PlanRef, SaveError> {
        let total = Self::validate(&draft)?;
        self.claim(SavePhase::SavingComponents { done: 0, total })?;
        let result = self.run(service, &draft).await;
        self.finish(result)
    }

    /// Like [`PlanPersistor::save`], with the admin check run inside the
    /// claimed save
    pub async fn save_as_admin<S: DataService + SessionService>(
        &self,
        service: &S,
        draft: DraftPlan,
    ) -> Result<PlanRef, SaveError> {
        self.claim_admin_save(draft)?.run(service).await
    }

    /// Claim the save now and run it later; the phase reads `Authorizing`
    /// from the moment this returns
    pub fn claim_admin_save(&self, draft: DraftPlan) -> Result<ClaimedSave, SaveError> {
        Self::validate(&draft)?;
        self.claim(SavePhase::Authorizing)?;
        Ok(ClaimedSave {
            persistor: self.clone(),
            draft,
        })
    }

    fn validate(draft: &DraftPlan) -> Result<usize, SaveError> {
        if draft.components.is_empty() {
            return Err(ValidationError::EmptyPlan.into());
        }
        Ok(draft.components.len())
    }

    fn claim(&self, start: SavePhase) -> Result<(), SaveError> {
        let mut phase = self.lock();
        if phase.is_busy() {
            warn!("Save requested while another save is running");
            return Err(SaveError::InProgress);
        }
        *phase = start;
        Ok(())
    }

    fn finish(&self, result: Result<PlanRef, SaveError>) -> Result<PlanRef, SaveError> {
        match &result {
            Ok(plan) => {
                info!(plan_id = plan.id, name = %plan.name, "Saved assembly plan");
                self.set(SavePhase::Done(plan.clone()));
            }
            Err(e) => {
                error!(error = %e, "Saving assembly plan failed");
                self.set(SavePhase::Failed(e.to_string()));
            }
        }
        result
    }

    async fn run<S: DataService>(
        &self,
        service: &S,
        draft: &DraftPlan,
    ) -> Result<PlanRef, SaveError> {
        let total = draft.components.len();
        let mut saved: HashMap<TempId, ComponentId> = HashMap::with_capacity(total);

        for (index, component) in draft.components.iter().enumerate() {
            let input = ComponentInput {
                product_id: draft.product_id,
                name: component.name.clone(),
                mesh_id: component.mesh_id.clone(),
            };
            let failure = match service.create_component(&input).await {
                Ok(Some(id)) => {
                    saved.insert(component.temp_id, id);
                    self.set(SavePhase::SavingComponents {
                        done: index + 1,
                        total,
                    });
                    continue;
                }
                Ok(None) => PersistenceError::MissingComponentId {
                    name: component.name.clone(),
                },
                Err(source) => PersistenceError::ComponentRejected {
                    name: component.name.clone(),
                    source,
                },
            };
            return Err(SaveError::Persistence {
                created: saved.len(),
                source: failure,
            });
        }

        self.set(SavePhase::SavingPlan);
        let steps = draft
            .order
            .iter()
            .enumerate()
            .map(|(index, temp_id)| -> Result<StepInput, ReconciliationError> {
                let component_id = saved
                    .get(temp_id)
                    .copied()
                    .ok_or(ReconciliationError(*temp_id))?;
                Ok(StepInput {
                    component_id,
                    step_number: index as u32 + 1,
                    action_type: ActionType::Assemble,
                })
            })
            .collect::<Result<Vec<_>, ReconciliationError>>()?;

        let plan = PlanInput {
            product_id: draft.product_id,
            name: draft.name.clone(),
            steps,
        };
        service
            .create_plan(&plan)
            .await
            .map_err(|e| SaveError::Persistence {
                created: saved.len(),
                source: PersistenceError::PlanRejected(e),
            })
    }

    fn set(&self, next: SavePhase) {
        *self.lock() = next;
    }

    fn lock(&self) -> MutexGuard<'_, SavePhase> {
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A save that already holds the persistor's guard
#[derive(Debug)]
#[must_use = "the persistor stays busy until the save runs"]
pub struct ClaimedSave {
    persistor: PlanPersistor,
    draft: DraftPlan,
}

impl ClaimedSave {
    /// Check the session, then create components and the plan
    pub async fn run<S: DataService + SessionService>(
        self,
        service: &S,
    ) -> Result<PlanRef, SaveError> {
        let persistor = &self.persistor;
        let result = match require_admin(service).await {
            Ok(session) => {
                info!(user = %session.username, "Authorized save");
                persistor.set(SavePhase::SavingComponents {
                    done: 0,
                    total: self.draft.components.len(),
                });
                persistor.run(service, &self.draft).await
            }
            Err(e) => Err(e.into()),
        };
        persistor.finish(result)
    }

    /// Give up without contacting the backend; the phase ends as `Failed`
    pub fn cancel(self, reason: &str) {
        warn!(reason, "Save cancelled");
        self.persistor.set(SavePhase::Failed(reason.to_string()));
    }
}
