//! Data service seams
//!
//! The core never talks to the network directly. Front ends plug in an
//! implementation of these traits (GraphQL over browser fetch, reqwest, or a
//! test double).

#![allow(async_fn_in_trait)]

use crate::error::ServiceError;
use crate::model::{
    AssemblyPlan, ComponentId, ComponentInput, PlanInput, PlanRef, Product, ProductId, Session,
};

/// Backend operations used by the editor and the player
pub trait DataService {
    /// Every product, for picking one to edit
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError>;

    /// Register a new product with no model yet
    async fn create_product(&self, name: &str) -> Result<Product, ServiceError>;

    /// Look up a product; `Ok(None)` when the backend has no such product
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, ServiceError>;

    /// Create one component; `Ok(None)` when the response carried no id
    async fn create_component(
        &self,
        input: &ComponentInput,
    ) -> Result<Option<ComponentId>, ServiceError>;

    /// Create a plan whose steps reference already-created components
    async fn create_plan(&self, input: &PlanInput) -> Result<PlanRef, ServiceError>;

    /// Plan assigned to a workstation, if any
    async fn plan_by_station(&self, station: &str) -> Result<Option<AssemblyPlan>, ServiceError>;
}

/// Session check against the auth endpoint
pub trait SessionService {
    /// `Ok(None)` when nobody is signed in
    async fn current_session(&self) -> Result<Option<Session>, ServiceError>;
}
