//! Scene/source control for the streaming software.
//!
//! The switcher only talks to the [`SceneController`] trait; [`ObsController`]
//! is the implementation backed by obs-websocket.

mod obs;

pub use obs::ObsController;

use crate::error::Result;

/// Opaque identifier of a source placed in a scene
pub type ItemId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneItem {
    pub id: ItemId,
    pub source_name: String,
}

pub trait SceneController {
    fn current_scene(&mut self) -> Result<String>;

    fn set_current_scene(&mut self, scene: &str) -> Result<()>;

    fn scene_items(&mut self, scene: &str) -> Result<Vec<SceneItem>>;

    fn is_source_visible(&mut self, scene: &str, item: ItemId) -> Result<bool>;

    fn set_source_visible(&mut self, scene: &str, item: ItemId, visible: bool) -> Result<()>;

    /// Look up a source in a scene by name (first match wins).
    fn find_source_item(&mut self, scene: &str, source: &str) -> Result<Option<ItemId>> {
        Ok(self
            .scene_items(scene)?
            .into_iter()
            .find(|item| item.source_name == source)
            .map(|item| item.id))
    }
}
