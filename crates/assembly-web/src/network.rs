//! Backend access from the browser
//!
//! Requests run as detached futures and push their results into
//! [`PendingEvents`]; [`apply_backend_events`] drains the queue each frame and
//! feeds the session. Nothing here blocks the render loop.

use std::sync::{Arc, Mutex};

use assembly_core::{AssemblyPlan, DraftPlan, LoadError, PlanPersistor, PlanRef, Product};
use assembly_scene::{load_glb, ModelLoadError};
use bevy::prelude::*;

use crate::app::{EditorForm, LaunchMode, Workbench};

/// Backend address used when the page is not served by the backend itself
const DEFAULT_API_URL: &str = "http://localhost:8000";

pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        let (config, mode) = BackendConfig::from_browser();
        let workbench = Workbench::for_mode(&mode);

        app.insert_resource(config)
            .insert_resource(mode)
            .insert_resource(workbench)
            .init_resource::<PendingEvents>()
            .add_message::<ModelLoaded>()
            .add_systems(Startup, start_loading)
            .add_systems(Update, apply_backend_events);
    }
}

/// Where the GraphQL endpoint, session check, and model assets live
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL without a trailing slash (e.g., "http://localhost:8000")
    pub api_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl BackendConfig {
    /// Read `?api=`, `?product_id=` and `?station=` from the page URL
    #[cfg(target_arch = "wasm32")]
    pub fn from_browser() -> (Self, LaunchMode) {
        let Some(window) = web_sys::window() else {
            return (Self::default(), LaunchMode::default());
        };
        let location = window.location();
        let search = location.search().unwrap_or_default();
        let origin = location.origin().ok();
        Self::from_search(&search, origin.as_deref())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_browser() -> (Self, LaunchMode) {
        (Self::default(), LaunchMode::default())
    }

    /// `origin` is the page's own origin; it is used only when `?api=` is absent
    pub fn from_search(search: &str, origin: Option<&str>) -> (Self, LaunchMode) {
        let api_url = parse_query_param(search, "api")
            .inspect(|api| tracing::info!("Using backend from URL parameter: {}", api))
            .or_else(|| origin.map(str::to_string))
            .filter(|url| url.starts_with("http"))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mode = match parse_query_param(search, "product_id") {
            Some(id) => LaunchMode::Editor {
                product_id: id.trim().parse().ok(),
            },
            None => LaunchMode::Player {
                station: parse_query_param(search, "station").filter(|s| !s.trim().is_empty()),
            },
        };
        (Self { api_url }, mode)
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.api_url)
    }

    pub fn session_url(&self) -> String {
        format!("{}/auth/token/me", self.api_url)
    }

    /// Model paths are server-relative; absolute URLs pass through
    pub fn asset_url(&self, model_path: &str) -> String {
        if model_path.starts_with("http://") || model_path.starts_with("https://") {
            model_path.to_string()
        } else if model_path.starts_with('/') {
            format!("{}{}", self.api_url, model_path)
        } else {
            format!("{}/{}", self.api_url, model_path)
        }
    }
}

/// Parse a query parameter from a search string
fn parse_query_param(search: &str, param: &str) -> Option<String> {
    let search = search.trim_start_matches('?');
    for pair in search.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            if key == param {
                return Some(
                    value
                        .replace('+', " ")
                        .replace("%20", " ")
                        .replace("%3A", ":")
                        .replace("%2F", "/"),
                );
            }
        }
    }
    None
}

/// Results delivered by background requests
#[derive(Debug)]
pub enum BackendEvent {
    Product(Product),
    Plan(AssemblyPlan),
    Model(Vec<u8>),
    ModelFetchFailed(String),
    LoadFailed(LoadError),
    Saved(Result<PlanRef, String>),
}

/// Shared queue between request futures and Bevy
#[derive(Resource, Default, Clone)]
pub struct PendingEvents(pub Arc<Mutex<Vec<BackendEvent>>>);

impl PendingEvents {
    pub fn push(&self, event: BackendEvent) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(event);
        }
    }

    fn drain(&self) -> Vec<BackendEvent> {
        match self.0.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }
}

/// Sent whenever the scene model was replaced or cleared
#[derive(Message)]
pub struct ModelLoaded;

/// Kick off the initial load for whichever page was requested
fn start_loading(
    mode: Res<LaunchMode>,
    config: Res<BackendConfig>,
    pending: Res<PendingEvents>,
    mut workbench: ResMut<Workbench>,
) {
    match (&*mode, &mut *workbench) {
        (LaunchMode::Player { station: None }, Workbench::Player(player)) => {
            player.fail(LoadError::MissingStation.to_string());
            return;
        }
        (LaunchMode::Editor { product_id: None }, _) => return,
        _ => {}
    }

    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let mode = (*mode).clone();
        let config = (*config).clone();
        let pending = (*pending).clone();
        spawn_local(async move {
            match mode {
                LaunchMode::Editor {
                    product_id: Some(id),
                } => browser::load_editor(&config, id, &pending).await,
                LaunchMode::Player {
                    station: Some(station),
                } => browser::load_player(&config, &station, &pending).await,
                _ => {}
            }
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (&config, &pending);
        tracing::warn!("Backend requests are not available in native mode");
    }
}

/// Save the current draft in the background; progress shows through the persistor
///
/// The save is claimed before this returns, so the Save button is disabled
/// from the very next frame.
pub fn save_plan(
    config: &BackendConfig,
    persistor: &PlanPersistor,
    draft: DraftPlan,
    pending: &PendingEvents,
) {
    let claimed = match persistor.claim_admin_save(draft) {
        Ok(claimed) => claimed,
        Err(e) => {
            pending.push(BackendEvent::Saved(Err(e.to_string())));
            return;
        }
    };

    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let config = config.clone();
        let pending = pending.clone();
        spawn_local(async move {
            let outcome = browser::save(&config, claimed).await;
            pending.push(BackendEvent::Saved(outcome));
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = config;
        let message = "Saving is not available in native mode";
        tracing::warn!("{}", message);
        claimed.cancel(message);
        pending.push(BackendEvent::Saved(Err(message.to_string())));
    }
}

/// Drain finished requests into the session
pub fn apply_backend_events(
    pending: Res<PendingEvents>,
    mut workbench: ResMut<Workbench>,
    mut form: ResMut<EditorForm>,
    mut staged_plan: Local<Option<AssemblyPlan>>,
    mut model_loaded: MessageWriter<ModelLoaded>,
) {
    for event in pending.drain() {
        match (event, &mut *workbench) {
            (BackendEvent::Product(product), Workbench::Editor(editor)) => {
                editor.set_product(product);
            }
            (BackendEvent::Plan(plan), Workbench::Player(_)) => {
                *staged_plan = Some(plan);
            }
            (BackendEvent::Model(bytes), workbench) => {
                match load_glb(&bytes) {
                    Ok(model) => match workbench {
                        Workbench::Editor(editor) => editor.load_model(model),
                        Workbench::Player(player) => match staged_plan.take() {
                            Some(plan) => {
                                player.start(plan, model);
                            }
                            None => player.fail("Model arrived before the plan"),
                        },
                    },
                    Err(e) => model_failed(workbench, &e),
                }
                model_loaded.write(ModelLoaded);
            }
            (BackendEvent::ModelFetchFailed(message), workbench) => {
                model_failed(workbench, &ModelLoadError::Fetch(message));
                model_loaded.write(ModelLoaded);
            }
            (BackendEvent::LoadFailed(error), Workbench::Editor(editor)) => {
                tracing::error!("Editor failed to load: {}", error);
                editor.set_message(error.to_string());
            }
            (BackendEvent::LoadFailed(error), Workbench::Player(player)) => {
                player.fail(error.to_string());
            }
            (BackendEvent::Saved(Ok(plan)), _) => {
                form.notice = Some(format!(
                    "Assembly plan '{}' saved successfully (ID: {})",
                    plan.name, plan.id
                ));
                form.plan_name.clear();
            }
            (BackendEvent::Saved(Err(message)), _) => {
                form.notice = Some(format!("Error saving plan: {}", message));
            }
            (event, _) => {
                tracing::debug!("Ignoring {:?} for this page", event);
            }
        }
    }
}

fn model_failed(workbench: &mut Workbench, error: &ModelLoadError) {
    match workbench {
        Workbench::Editor(editor) => editor.model_failed(error),
        Workbench::Player(player) => player.model_failed(error),
    }
}

/// Fetch API adapters; only meaningful inside a browser
#[cfg(target_arch = "wasm32")]
mod browser {
    use assembly_core::{
        require_admin, ClaimedSave, DataService, GraphqlService, LoadError, PlanRef, ProductId,
        ServiceError, Transport,
    };
    use gloo_net::http::{Request, RequestBuilder, Response};
    use web_sys::RequestCredentials;

    use super::{BackendConfig, BackendEvent, PendingEvents};

    /// Browser storage key holding the admin bearer token
    const TOKEN_KEY: &str = "admin_token";

    /// GraphQL and session requests through `fetch`, with cookies included
    pub struct BrowserTransport {
        config: BackendConfig,
    }

    impl BrowserTransport {
        pub fn new(config: &BackendConfig) -> Self {
            Self {
                config: config.clone(),
            }
        }
    }

    fn admin_token() -> Option<String> {
        web_sys::window()?
            .local_storage()
            .ok()??
            .get_item(TOKEN_KEY)
            .ok()?
    }

    fn with_token(request: RequestBuilder) -> RequestBuilder {
        match admin_token() {
            Some(token) => request.header("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    fn network(e: gloo_net::Error) -> ServiceError {
        ServiceError::Network(e.to_string())
    }

    async fn read_text(response: Response) -> Result<String, ServiceError> {
        let status = response.status();
        let text = response.text().await.map_err(network)?;
        if response.ok() {
            Ok(text)
        } else {
            Err(ServiceError::Http {
                status,
                message: text,
            })
        }
    }

    impl Transport for BrowserTransport {
        async fn post_graphql(&self, body: String, protected: bool) -> Result<String, ServiceError> {
            let mut request = Request::post(&self.config.graphql_url())
                .header("Content-Type", "application/json")
                .credentials(RequestCredentials::Include);
            if protected {
                request = with_token(request);
            }
            let response = request.body(body).map_err(network)?.send().await.map_err(network)?;
            read_text(response).await
        }

        async fn fetch_session(&self) -> Result<Option<String>, ServiceError> {
            let request = with_token(
                Request::get(&self.config.session_url()).credentials(RequestCredentials::Include),
            );
            let response = request.send().await.map_err(network)?;
            if matches!(response.status(), 401 | 403) {
                return Ok(None);
            }
            read_text(response).await.map(Some)
        }
    }

    async fn fetch_model(config: &BackendConfig, model_path: &str, pending: &PendingEvents) {
        let url = config.asset_url(model_path);
        tracing::info!("Fetching model from: {}", url);

        let result = match Request::get(&url).send().await {
            Ok(response) if response.ok() => response.binary().await.map_err(|e| e.to_string()),
            Ok(response) => Err(format!("HTTP {} for {}", response.status(), url)),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(bytes) => pending.push(BackendEvent::Model(bytes)),
            Err(message) => {
                tracing::error!("Failed to fetch model: {}", message);
                pending.push(BackendEvent::ModelFetchFailed(message));
            }
        }
    }

    pub async fn load_editor(config: &BackendConfig, product_id: ProductId, pending: &PendingEvents) {
        let service = GraphqlService::new(BrowserTransport::new(config));
        if let Err(e) = require_admin(&service).await {
            pending.push(BackendEvent::LoadFailed(e.into()));
            return;
        }

        match service.product_by_id(product_id).await {
            Ok(Some(product)) => {
                let model_path = product.model_path.clone().filter(|p| !p.is_empty());
                pending.push(BackendEvent::Product(product));
                if let Some(path) = model_path {
                    fetch_model(config, &path, pending).await;
                }
            }
            Ok(None) => pending.push(BackendEvent::LoadFailed(LoadError::ProductNotFound(
                product_id,
            ))),
            Err(e) => pending.push(BackendEvent::LoadFailed(e.into())),
        }
    }

    pub async fn load_player(config: &BackendConfig, station: &str, pending: &PendingEvents) {
        let service = GraphqlService::new(BrowserTransport::new(config));
        match service.plan_by_station(station).await {
            Ok(Some(plan)) => match plan.model_path().map(str::to_string) {
                Some(path) => {
                    tracing::info!("Loaded plan '{}' for station {}", plan.name, station);
                    pending.push(BackendEvent::Plan(plan));
                    fetch_model(config, &path, pending).await;
                }
                None => pending.push(BackendEvent::LoadFailed(LoadError::MissingModelPath)),
            },
            Ok(None) => pending.push(BackendEvent::LoadFailed(LoadError::PlanNotFound(
                station.to_string(),
            ))),
            Err(e) => pending.push(BackendEvent::LoadFailed(e.into())),
        }
    }

    pub async fn save(config: &BackendConfig, claimed: ClaimedSave) -> Result<PlanRef, String> {
        let service = GraphqlService::new(BrowserTransport::new(config));
        claimed.run(&service).await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_selects_editor() {
        let (config, mode) =
            BackendConfig::from_search("?product_id=42", Some("https://plans.example.com"));
        assert_eq!(config.api_url, "https://plans.example.com");
        assert_eq!(mode, LaunchMode::Editor { product_id: Some(42) });
    }

    #[test]
    fn test_bad_product_id_is_none() {
        let (_, mode) = BackendConfig::from_search("?product_id=abc", None);
        assert_eq!(mode, LaunchMode::Editor { product_id: None });
    }

    #[test]
    fn test_station_selects_player() {
        let (config, mode) = BackendConfig::from_search(
            "?station=WS-01&api=http%3A%2F%2F10.0.0.5%3A8000%2F",
            Some("http://localhost:3000"),
        );
        assert_eq!(config.api_url, "http://10.0.0.5:8000");
        assert_eq!(
            mode,
            LaunchMode::Player {
                station: Some("WS-01".to_string())
            }
        );
    }

    #[test]
    fn test_empty_station_is_missing() {
        let (config, mode) = BackendConfig::from_search("?station=", None);
        assert_eq!(config, BackendConfig::default());
        assert_eq!(mode, LaunchMode::Player { station: None });
    }

    #[test]
    fn test_file_origin_falls_back_to_default() {
        let (config, _) = BackendConfig::from_search("", Some("null"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_asset_urls() {
        let config = BackendConfig::default();
        assert_eq!(
            config.asset_url("/models/cart.glb"),
            "http://localhost:8000/models/cart.glb"
        );
        assert_eq!(
            config.asset_url("models/cart.glb"),
            "http://localhost:8000/models/cart.glb"
        );
        assert_eq!(
            config.asset_url("https://cdn.example.com/cart.glb"),
            "https://cdn.example.com/cart.glb"
        );
        assert_eq!(config.graphql_url(), "http://localhost:8000/graphql");
        assert_eq!(config.session_url(), "http://localhost:8000/auth/token/me");
    }

    #[test]
    fn test_save_without_backend_releases_the_claim() {
        use assembly_core::{ComponentRegistry, SavePhase, StepSequencer};

        let mut registry = ComponentRegistry::new();
        let mut sequencer = StepSequencer::new();
        sequencer.push(registry.add_component("Bolt", "M8").unwrap().temp_id);
        let draft = DraftPlan::snapshot(1, None, &registry, &sequencer);

        let persistor = PlanPersistor::new();
        let pending = PendingEvents::default();
        save_plan(&BackendConfig::default(), &persistor, draft.clone(), &pending);
        assert!(matches!(persistor.phase(), SavePhase::Failed(_)));

        // A claimed save blocks the next one until it finishes
        let claimed = persistor.claim_admin_save(draft.clone()).unwrap();
        save_plan(&BackendConfig::default(), &persistor, draft, &pending);
        let events = pending.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            BackendEvent::Saved(Err(message)) if message == "A save is already in progress"
        ));
        claimed.cancel("cancelled");
        assert!(!persistor.is_busy());
    }

    #[test]
    fn test_pending_events_drain_once() {
        let pending = PendingEvents::default();
        pending.push(BackendEvent::ModelFetchFailed("404".to_string()));
        assert_eq!(pending.drain().len(), 1);
        assert!(pending.drain().is_empty());
    }
}
