//! Plan data model shared by the editor, the player, and the service adapters
//!
//! Wire-facing types use camelCase field names to match the backend's GraphQL
//! schema. Draft types never leave the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend product identifier
pub type ProductId = i64;
/// Backend component identifier, assigned on creation
pub type ComponentId = i64;
/// Backend plan identifier
pub type PlanId = i64;

/// Product as served by the backend (read-only to the client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Server-relative path of the product's 3D asset, if one was uploaded
    #[serde(default)]
    pub model_path: Option<String>,
}

/// Session-local placeholder identity for a component that has not been saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(u64);

impl TempId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

/// A component the admin has named but not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftComponent {
    pub temp_id: TempId,
    /// Display label entered by the admin (trimmed, never empty)
    pub name: String,
    /// Node name inside the loaded model
    pub mesh_id: String,
}

/// What the operator does at a step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    #[default]
    Assemble,
    Tighten,
    Insert,
    Connect,
    Inspect,
    /// Any value the backend stores that this client does not know about
    Other(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::Assemble => "Assemble",
            ActionType::Tighten => "Tighten",
            ActionType::Insert => "Insert",
            ActionType::Connect => "Connect",
            ActionType::Inspect => "Inspect",
            ActionType::Other(other) => other,
        }
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "assemble" => ActionType::Assemble,
            "tighten" => ActionType::Tighten,
            "insert" => ActionType::Insert,
            "connect" => ActionType::Connect,
            "inspect" => ActionType::Inspect,
            _ => ActionType::Other(value),
        }
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component as referenced by a persisted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanComponent {
    pub name: String,
    pub mesh_id: String,
}

/// One persisted instruction of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyStep {
    pub step_number: u32,
    #[serde(default)]
    pub action_type: ActionType,
    pub component: PlanComponent,
}

/// Product reference carried by a fetched plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanProduct {
    pub name: String,
    #[serde(default)]
    pub model_path: Option<String>,
}

/// A persisted plan as fetched for playback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyPlan {
    #[serde(default)]
    pub id: Option<PlanId>,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<AssemblyStep>,
    #[serde(default)]
    pub product: Option<PlanProduct>,
}

impl AssemblyPlan {
    /// Model path of the plan's product, if the backend provided one
    pub fn model_path(&self) -> Option<&str> {
        self.product
            .as_ref()
            .and_then(|p| p.model_path.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Order steps by their step number
    pub fn sort_steps(&mut self) {
        self.steps.sort_by_key(|s| s.step_number);
    }
}

/// Component creation request (phase 1 of a save)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInput {
    pub product_id: ProductId,
    pub name: String,
    pub mesh_id: String,
}

/// Step reference inside a plan creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub component_id: ComponentId,
    pub step_number: u32,
    pub action_type: ActionType,
}

/// Plan creation request (phase 2 of a save)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub product_id: ProductId,
    pub name: String,
    pub steps: Vec<StepInput>,
}

/// Identity of a plan the backend accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRef {
    pub id: PlanId,
    pub name: String,
}

/// Session info returned by the session check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    /// The backend only issues sessions to admins and omits this flag; an
    /// explicit `false` marks a non-admin account
    #[serde(default, alias = "is_admin", skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_round_trips_known_and_unknown() {
        assert_eq!(ActionType::from("tighten".to_string()), ActionType::Tighten);
        assert_eq!(
            ActionType::from("Solder".to_string()),
            ActionType::Other("Solder".to_string())
        );
        assert_eq!(String::from(ActionType::default()), "Assemble");
    }

    #[test]
    fn test_plan_deserializes_from_backend_shape() {
        let json = r#"{
            "name": "Plan A",
            "steps": [
                {"stepNumber": 2, "actionType": "Assemble", "component": {"name": "Right wheel", "meshId": "Wheel-R"}},
                {"stepNumber": 1, "actionType": "tighten", "component": {"name": "Left wheel", "meshId": "Wheel-L"}}
            ],
            "product": {"name": "Cart", "modelPath": "/static/models/cart.glb"}
        }"#;

        let mut plan: AssemblyPlan = serde_json::from_str(json).unwrap();
        plan.sort_steps();

        assert_eq!(plan.steps[0].component.mesh_id, "Wheel-L");
        assert_eq!(plan.steps[0].action_type, ActionType::Tighten);
        assert_eq!(plan.model_path(), Some("/static/models/cart.glb"));
    }

    #[test]
    fn test_backend_session_payload_is_admin() {
        // `/auth/token/me` answers with the username only
        let session: Session = serde_json::from_str(r#"{"username": "admin"}"#).unwrap();
        assert_eq!(session.is_admin, None);
        assert!(session.is_admin());

        let session: Session =
            serde_json::from_str(r#"{"username": "guest", "isAdmin": false}"#).unwrap();
        assert!(!session.is_admin());
    }
}
