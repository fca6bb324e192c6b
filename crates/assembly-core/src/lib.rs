//! Assembly Core - Plan model, drafting, persistence, and playback logic
//!
//! This crate holds everything that does not depend on a 3D scene:
//! - Plan data model and error taxonomy
//! - Draft component registry and step sequencer
//! - Two-phase plan persistence against a data service
//! - Forward-only playback state machine
//! - GraphQL codec and the admin authorization rule

pub mod auth;
pub mod error;
pub mod graphql;
pub mod model;
pub mod persist;
pub mod playback;
pub mod registry;
pub mod sequencer;
pub mod service;

pub use auth::{authorize_admin, require_admin};
pub use error::{AuthError, LoadError, ServiceError, ValidationError};
pub use graphql::{GraphqlRequest, GraphqlService, Transport};
pub use model::{
    ActionType, AssemblyPlan, AssemblyStep, ComponentId, DraftComponent, PlanRef, Product,
    ProductId, Session, TempId,
};
pub use persist::{
    ClaimedSave, DraftPlan, PersistenceError, PlanPersistor, SaveError, SavePhase,
};
pub use playback::{PlaybackEngine, PlaybackState, StepView, Transition};
pub use registry::ComponentRegistry;
pub use sequencer::StepSequencer;
pub use service::{DataService, SessionService};
