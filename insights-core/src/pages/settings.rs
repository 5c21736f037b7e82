//! System settings, interface preferences and maintenance actions.
//!
//! Unlike the web page this replaces, a failed settings save is reported as
//! a failure: the backend's answer is never masked.

use super::PageContext;
use crate::error::InsightsError;
use crate::models::SystemSettings;
use crate::prefs::{PreferenceStore, UserPreferences};
use crate::render;
use crate::surface::{Level, Region};

pub const RESET_PROMPT: &str =
    "Reset the system? This clears local preferences, re-initialises the backend and empties its cache.";

pub struct SettingsPage<'a> {
    ctx: PageContext<'a>,
    settings: SystemSettings,
    prefs: UserPreferences,
}

impl<'a> SettingsPage<'a> {
    pub fn new(ctx: PageContext<'a>, prefs: UserPreferences) -> Self {
        ctx.surface.apply_preferences(&prefs);
        Self {
            ctx,
            settings: SystemSettings::default(),
            prefs,
        }
    }

    pub fn settings(&self) -> &SystemSettings {
        &self.settings
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.prefs
    }

    fn render(&self) {
        self.ctx
            .surface
            .render(Region::SystemSettings, &render::system_settings(&self.settings));
        self.ctx
            .surface
            .render(Region::InterfaceSettings, &render::interface_settings(&self.prefs));
    }

    /// Fetch system settings, falling back to defaults when unavailable.
    pub async fn load(&mut self) {
        self.settings = match self.ctx.api.settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => SystemSettings::default(),
            Err(e) => {
                tracing::debug!(error = %e, "settings unavailable, showing defaults");
                SystemSettings::default()
            }
        };
        self.render();
    }

    pub async fn save_system(&mut self, settings: SystemSettings) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Saving system settings...");
            self.ctx.api.save_settings(&settings).await
        };

        match result {
            Ok(_) => {
                self.settings = settings;
                self.render();
                self.ctx.toast(Level::Success, "System settings saved successfully");
                true
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to save system settings"));
                false
            }
        }
    }

    /// Persist every interface preference and apply it immediately.
    pub fn save_interface(
        &mut self,
        prefs: UserPreferences,
        store: &mut PreferenceStore,
    ) -> Result<(), InsightsError> {
        prefs.save(store)?;
        self.prefs = prefs;
        self.ctx.surface.apply_preferences(&self.prefs);
        self.render();
        self.ctx.toast(Level::Success, "Interface settings saved successfully");
        Ok(())
    }

    pub fn toggle_dark_mode(&mut self, store: &mut PreferenceStore) -> Result<bool, InsightsError> {
        let dark = self.prefs.toggle_dark_mode(store)?;
        self.ctx.surface.apply_preferences(&self.prefs);
        Ok(dark)
    }

    pub async fn initialise(&self) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Initialising system...");
            self.ctx.api.initialise().await
        };

        match result {
            Ok(_) => {
                self.ctx.toast(Level::Success, "System initialised successfully");
                true
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to initialise system"));
                false
            }
        }
    }

    pub async fn clear_cache(&self) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Clearing cache...");
            self.ctx.api.clear_cache().await
        };

        match result {
            Ok(message) => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Cache cleared successfully".to_string());
                self.ctx.toast(Level::Success, message);
                true
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to clear cache"));
                false
            }
        }
    }

    /// Wipe local preferences, then re-initialise and clear the backend cache.
    pub async fn reset(&mut self, store: &mut PreferenceStore) -> bool {
        if !self.ctx.surface.confirm(RESET_PROMPT) {
            return false;
        }

        let _overlay = self.ctx.overlay("Resetting system...");

        let cleared = store.clear();
        self.prefs = UserPreferences::default();
        self.ctx.surface.apply_preferences(&self.prefs);
        self.render();

        let initialised = self.ctx.api.initialise().await;
        let cache = self.ctx.api.clear_cache().await;

        let failures: Vec<String> = [
            cleared.err().map(|e| e.to_string()),
            initialised.err().map(|e| e.to_string()),
            cache.err().map(|e| e.to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if failures.is_empty() {
            self.ctx.toast(Level::Success, "System has been reset to default settings");
            true
        } else {
            tracing::warn!(failures = ?failures, "system reset incomplete");
            self.ctx.toast(
                Level::Warning,
                "Error during system reset. Some settings may not have been reset properly.",
            );
            false
        }
    }
}
