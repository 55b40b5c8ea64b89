//! Polling loop and mode logic.
//!
//! Every tick reads the scene OBS is showing and the RockSniffer state, then
//! either:
//!
//! - **SwitchScenes**: shows the song scene while a song is active and the
//!   main scene otherwise, but only acts when the game state changes while
//!   the menu or song scene is live, or
//! - **ToggleSources**: while the main scene is live, shows/hides each
//!   configured source depending on whether a song is active.
//!
//! Calls that change OBS are edge-triggered: nothing is sent when OBS
//! already matches the wanted result.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::{Behaviour, Mode, Settings};
use crate::controller::{ItemId, SceneController};
use crate::error::Result;
use crate::game::GameState;
use crate::network::StateSource;
use crate::shutdown::ShutdownSignal;

/// Values carried from one tick to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopState {
    /// Last game state acted upon
    pub previous_state: Option<GameState>,
    /// Last scene this process switched to
    pub previous_scene: Option<String>,
}

/// Scene item ids keyed by (scene, source)
#[derive(Debug, Default)]
struct ItemCache {
    ids: HashMap<(String, String), ItemId>,
}

impl ItemCache {
    fn resolve<C>(&mut self, controller: &mut C, scene: &str, source: &str) -> Option<ItemId>
    where
        C: SceneController + ?Sized,
    {
        let key = (scene.to_string(), source.to_string());
        if let Some(id) = self.ids.get(&key) {
            return Some(*id);
        }

        match controller.find_source_item(scene, source) {
            Ok(Some(id)) => {
                debug!("Resolved '{}' in '{}' to item {}", source, scene, id);
                self.ids.insert(key, id);
                Some(id)
            }
            Ok(None) => {
                debug!("Source '{}' not found in '{}'", source, scene);
                None
            }
            Err(e) => {
                warn!(
                    "Error getting scene item ID for '{}' in '{}': {}",
                    source, scene, e
                );
                None
            }
        }
    }

    fn forget(&mut self, scene: &str, source: &str) {
        self.ids.remove(&(scene.to_string(), source.to_string()));
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

pub struct Switcher {
    settings: Settings,
    state: LoopState,
    items: ItemCache,
}

impl Switcher {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: LoopState::default(),
            items: ItemCache::default(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Number of cached scene item ids
    pub fn cached_items(&self) -> usize {
        self.items.len()
    }

    /// Run one polling iteration.
    pub fn tick<G, C>(&mut self, game: &G, controller: &mut C) -> Result<()>
    where
        G: StateSource + ?Sized,
        C: SceneController + ?Sized,
    {
        let current_scene = controller.current_scene()?;
        let game_state = game.fetch_state()?;

        match self.settings.behaviour.mode {
            Mode::ToggleSources => self.toggle_sources(game_state, &current_scene, controller),
            Mode::SwitchScenes => self.switch_scene(game_state, &current_scene, controller),
        }
    }

    /// Poll until shutdown. Errors from a single tick are logged and the next
    /// tick runs after the usual interval.
    pub fn run<G, C>(&mut self, game: &G, controller: &mut C, shutdown: &ShutdownSignal)
    where
        G: StateSource + ?Sized,
        C: SceneController + ?Sized,
    {
        let interval = self.settings.behaviour.poll_interval;
        info!(
            "Polling every {}ms in {} mode",
            interval.as_millis(),
            self.settings.behaviour.mode
        );

        while !shutdown.is_shutdown() {
            if let Err(e) = self.tick(game, controller) {
                warn!("Error: {}", e);
            }

            if shutdown.wait(interval) {
                break;
            }
        }
    }

    fn switch_scene<C>(
        &mut self,
        game_state: GameState,
        current_scene: &str,
        controller: &mut C,
    ) -> Result<()>
    where
        C: SceneController + ?Sized,
    {
        if self.state.previous_state == Some(game_state) {
            return Ok(());
        }

        let behaviour = &self.settings.behaviour;
        if !behaviour.is_managed_scene(current_scene) {
            // Leave the operator's scene alone; the change is picked up again
            // once OBS is back on the song or menu scene.
            debug!(
                "Holding state change to {} while '{}' is live",
                game_state, current_scene
            );
            return Ok(());
        }

        let target = target_scene(behaviour, game_state);
        if self.state.previous_scene.as_deref() != Some(target) {
            controller.set_current_scene(target)?;
            info!(
                "Scene changed {} -> {}",
                self.state.previous_scene.as_deref().unwrap_or("None"),
                target
            );
            self.state.previous_scene = Some(target.to_string());
        }

        info!(
            "State changed {} -> {}",
            describe(self.state.previous_state),
            game_state
        );
        self.state.previous_state = Some(game_state);
        Ok(())
    }

    fn toggle_sources<C>(
        &mut self,
        game_state: GameState,
        current_scene: &str,
        controller: &mut C,
    ) -> Result<()>
    where
        C: SceneController + ?Sized,
    {
        if self.state.previous_state != Some(game_state) {
            debug!(
                "State changed {} -> {}",
                describe(self.state.previous_state),
                game_state
            );
            self.state.previous_state = Some(game_state);
        }

        let behaviour = &self.settings.behaviour;
        let main_scene = behaviour.main_scene.as_str();
        if current_scene != main_scene {
            return Ok(());
        }

        let game_active = game_state.is_active();
        for rule in &behaviour.sources {
            let Some(item) = self.items.resolve(controller, main_scene, &rule.name) else {
                continue;
            };

            let visible = match controller.is_source_visible(main_scene, item) {
                Ok(visible) => visible,
                Err(e) => {
                    // The id may belong to a source that was removed and re-added
                    self.items.forget(main_scene, &rule.name);
                    return Err(e);
                }
            };

            let desired = rule.state.desired_visibility(game_active);
            if visible != desired {
                controller.set_source_visible(main_scene, item, desired)?;
                info!(
                    "{} {}",
                    rule.name,
                    if desired { "enabled" } else { "disabled" }
                );
            }
        }

        Ok(())
    }
}

/// Scene to show for a game state in switch mode
pub fn target_scene(behaviour: &Behaviour, game_state: GameState) -> &str {
    if game_state.is_active() {
        &behaviour.song_scene
    } else {
        &behaviour.main_scene
    }
}

fn describe(state: Option<GameState>) -> String {
    state.map_or_else(|| "None".to_string(), |s| s.to_string())
}
