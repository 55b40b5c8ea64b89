use std::future::Future;
use std::time::Duration;

use obws::Client;
use obws::requests::scene_items::SetEnabled;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use super::{ItemId, SceneController, SceneItem};
use crate::config::ControllerSettings;
use crate::error::{Error, Result};

/// Upper bound for a single obs-websocket request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for the websocket handshake and identification
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking wrapper around an obs-websocket client.
///
/// The client is async; each call is driven to completion on a private
/// current-thread runtime so callers stay sequential.
pub struct ObsController {
    runtime: Runtime,
    client: Client,
}

impl ObsController {
    pub fn connect(settings: &ControllerSettings) -> Result<Self> {
        let address = settings.address();
        let connection_error = |message: String| Error::Connection {
            address: address.clone(),
            message,
        };

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| connection_error(format!("failed to start runtime: {}", e)))?;

        let password = (!settings.password.is_empty()).then_some(settings.password.as_str());
        let client = runtime
            .block_on(async {
                tokio::time::timeout(
                    CONNECT_TIMEOUT,
                    Client::connect(&settings.host, settings.port, password),
                )
                .await
            })
            .map_err(|_| connection_error("timed out".to_string()))?
            .map_err(|e| connection_error(e.to_string()))?;

        info!("Connected to OBS WebSocket at {}", address);
        Ok(Self { runtime, client })
    }

    fn call<T, F>(&self, what: &str, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, obws::Error>>,
    {
        self.runtime
            .block_on(async { tokio::time::timeout(REQUEST_TIMEOUT, request).await })
            .map_err(|_| Error::Network(format!("OBS request '{}' timed out", what)))?
            .map_err(|e| Error::Network(format!("OBS request '{}' failed: {}", what, e)))
    }
}

impl SceneController for ObsController {
    fn current_scene(&mut self) -> Result<String> {
        self.call(
            "GetCurrentProgramScene",
            self.client.scenes().current_program_scene(),
        )
    }

    fn set_current_scene(&mut self, scene: &str) -> Result<()> {
        self.call(
            "SetCurrentProgramScene",
            self.client.scenes().set_current_program_scene(scene),
        )
    }

    fn scene_items(&mut self, scene: &str) -> Result<Vec<SceneItem>> {
        let items = self.call("GetSceneItemList", self.client.scene_items().list(scene))?;
        debug!("Scene '{}' has {} item(s)", scene, items.len());
        Ok(items
            .into_iter()
            .map(|item| SceneItem {
                id: item.id,
                source_name: item.source_name,
            })
            .collect())
    }

    fn is_source_visible(&mut self, scene: &str, item: ItemId) -> Result<bool> {
        self.call(
            "GetSceneItemEnabled",
            self.client.scene_items().enabled(scene, item),
        )
    }

    fn set_source_visible(&mut self, scene: &str, item: ItemId, visible: bool) -> Result<()> {
        self.call(
            "SetSceneItemEnabled",
            self.client.scene_items().set_enabled(SetEnabled {
                scene,
                item_id: item,
                enabled: visible,
            }),
        )
    }
}
