//! GraphQL request/response codec and a transport-agnostic client
//!
//! Requests are `{query, variables}` JSON bodies; responses are the usual
//! `{data, errors}` envelope. Actual HTTP is delegated to a [`Transport`] so
//! the same client runs in the browser and in the CLI.

#![allow(async_fn_in_trait)]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::model::{
    AssemblyPlan, ComponentId, ComponentInput, PlanInput, PlanRef, Product, ProductId, Session,
};
use crate::service::{DataService, SessionService};

const ALL_PRODUCTS: &str = r#"
query GetAllProducts {
    allProducts {
        id
        name
    }
}"#;

const CREATE_PRODUCT: &str = r#"
mutation CreateNewProduct($name: String!) {
    createProduct(name: $name, description: "") {
        id
        name
    }
}"#;

const PRODUCT_BY_ID: &str = r#"
query GetProduct($productId: ID!) {
    productById(productId: $productId) {
        id
        name
        description
        modelPath
    }
}"#;

const ADD_COMPONENT: &str = r#"
mutation AddComponent($component: ComponentInput!) {
    addComponent(component: $component) {
        id
    }
}"#;

const CREATE_ASSEMBLY_PLAN: &str = r#"
mutation CreateAssemblyPlan($productId: Int!, $planName: String!, $steps: [AssemblyStepInput!]!) {
    createAssemblyPlan(productId: $productId, name: $planName, steps: $steps) {
        id
        name
    }
}"#;

const PLAN_BY_COMPUTER: &str = r#"
query GetPlanByComputer($computerName: String!) {
    assemblyPlanByComputerName(computerName: $computerName) {
        name
        steps {
            stepNumber
            actionType
            component {
                name
                meshId
            }
        }
        product {
            name
            modelPath
        }
    }
}"#;

/// Body of a GraphQL POST
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: &'static str,
    pub variables: Value,
}

impl GraphqlRequest {
    pub fn all_products() -> Self {
        Self {
            query: ALL_PRODUCTS,
            variables: json!({}),
        }
    }

    pub fn create_product(name: &str) -> Self {
        Self {
            query: CREATE_PRODUCT,
            variables: json!({ "name": name }),
        }
    }

    pub fn product_by_id(id: ProductId) -> Self {
        Self {
            query: PRODUCT_BY_ID,
            variables: json!({ "productId": id }),
        }
    }

    pub fn add_component(input: &ComponentInput) -> Self {
        Self {
            query: ADD_COMPONENT,
            variables: json!({ "component": input }),
        }
    }

    pub fn create_plan(input: &PlanInput) -> Self {
        Self {
            query: CREATE_ASSEMBLY_PLAN,
            variables: json!({
                "productId": input.product_id,
                "planName": input.name,
                "steps": input.steps,
            }),
        }
    }

    pub fn plan_by_station(station: &str) -> Self {
        Self {
            query: PLAN_BY_COMPUTER,
            variables: json!({ "computerName": station }),
        }
    }

    pub fn to_body(&self) -> Result<String, ServiceError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

/// Unwrap a `{data, errors}` envelope, turning any reported errors into one
/// [`ServiceError::Graphql`]
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
        return Err(ServiceError::Graphql(
            errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    envelope
        .data
        .ok_or_else(|| ServiceError::Decode("response has no data".to_string()))
}

/// GraphQL `ID` values arrive as either numbers or strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn to_i64(&self) -> Option<i64> {
        match self {
            WireId::Number(n) => Some(*n),
            WireId::Text(s) => s.parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: WireId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    model_path: Option<String>,
}

impl ProductNode {
    fn into_product(self) -> Result<Product, ServiceError> {
        let id = self
            .id
            .to_i64()
            .ok_or_else(|| ServiceError::Decode("product id is not an integer".to_string()))?;
        Ok(Product {
            id,
            name: self.name,
            description: self.description,
            model_path: self.model_path,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductData {
    product_by_id: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllProductsData {
    #[serde(default)]
    all_products: Vec<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProductData {
    create_product: ProductNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddComponentData {
    add_component: Option<ComponentNode>,
}

#[derive(Debug, Deserialize)]
struct ComponentNode {
    #[serde(default)]
    id: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlanData {
    create_assembly_plan: PlanNode,
}

#[derive(Debug, Deserialize)]
struct PlanNode {
    id: WireId,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanByComputerData {
    assembly_plan_by_computer_name: Option<AssemblyPlan>,
}

/// Moves request bodies to the backend and returns raw response text
pub trait Transport {
    /// POST a GraphQL body. `protected` requests carry the admin credential.
    async fn post_graphql(&self, body: String, protected: bool) -> Result<String, ServiceError>;

    /// GET the session endpoint. `Ok(None)` for 401/403.
    async fn fetch_session(&self) -> Result<Option<String>, ServiceError>;
}

/// [`DataService`] and [`SessionService`] over a GraphQL [`Transport`]
#[derive(Debug, Clone)]
pub struct GraphqlService<T> {
    transport: T,
}

impl<T: Transport> GraphqlService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn execute<D: DeserializeOwned>(
        &self,
        request: GraphqlRequest,
        protected: bool,
    ) -> Result<D, ServiceError> {
        let body = request.to_body()?;
        let response = self.transport.post_graphql(body, protected).await?;
        decode_envelope(&response).inspect_err(|e| warn!(error = %e, "GraphQL request failed"))
    }
}

impl<T: Transport> DataService for GraphqlService<T> {
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        let data: AllProductsData = self.execute(GraphqlRequest::all_products(), true).await?;
        data.all_products
            .into_iter()
            .map(ProductNode::into_product)
            .collect()
    }

    async fn create_product(&self, name: &str) -> Result<Product, ServiceError> {
        let data: CreateProductData = self
            .execute(GraphqlRequest::create_product(name), true)
            .await?;
        let product = data.create_product.into_product()?;
        debug!(id = product.id, name = %product.name, "Created product");
        Ok(product)
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, ServiceError> {
        let data: ProductData = self.execute(GraphqlRequest::product_by_id(id), true).await?;
        data.product_by_id.map(ProductNode::into_product).transpose()
    }

    async fn create_component(
        &self,
        input: &ComponentInput,
    ) -> Result<Option<ComponentId>, ServiceError> {
        let data: AddComponentData = self
            .execute(GraphqlRequest::add_component(input), true)
            .await?;
        let id = data.add_component.and_then(|c| c.id.as_i64());
        debug!(mesh = %input.mesh_id, ?id, "Created component");
        Ok(id)
    }

    async fn create_plan(&self, input: &PlanInput) -> Result<PlanRef, ServiceError> {
        let data: CreatePlanData = self.execute(GraphqlRequest::create_plan(input), true).await?;
        let node = data.create_assembly_plan;
        let id = node
            .id
            .to_i64()
            .ok_or_else(|| ServiceError::Decode("plan id is not an integer".to_string()))?;
        Ok(PlanRef {
            id,
            name: node.name,
        })
    }

    async fn plan_by_station(&self, station: &str) -> Result<Option<AssemblyPlan>, ServiceError> {
        let data: PlanByComputerData = self
            .execute(GraphqlRequest::plan_by_station(station), false)
            .await?;
        Ok(data.assembly_plan_by_computer_name.map(|mut plan| {
            plan.sort_steps();
            plan
        }))
    }
}

impl<T: Transport> SessionService for GraphqlService<T> {
    async fn current_session(&self) -> Result<Option<Session>, ServiceError> {
        match self.transport.fetch_session().await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }
}
