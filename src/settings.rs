//! User preferences
//!
//! Persisted in LocalStorage, separately from anything the questionnaire
//! stores.

use serde::{Deserialize, Serialize};

/// Scale preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Accessibility ===
    /// Skip bowl dips and drop animations; panels appear settled
    pub reduced_motion: bool,

    // === HUD ===
    /// Print the energy figure on each tile
    pub show_energy_values: bool,
    /// Draw the equilibrium marker next to the beam
    pub show_equilibrium: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            show_energy_values: true,
            show_equilibrium: false,
        }
    }
}

impl Settings {
    /// Whether bowls should react to impulses
    pub fn bowl_dips_enabled(&self) -> bool {
        !self.reduced_motion
    }

    /// Whether panels should fall and bounce rather than appear in place
    pub fn panel_drops_enabled(&self) -> bool {
        !self.reduced_motion
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "energy_scale_settings";

    /// Load settings from LocalStorage (WASM only)
    ///
    /// Without a stored value the browser's reduced-motion preference decides.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let window = web_sys::window();
        let storage = window
            .as_ref()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Discarding stored settings: {e}"),
                }
            }
        }

        let prefers_reduced = window
            .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok())
            .flatten()
            .is_some_and(|q| q.matches());

        log::info!("Using default settings (reduced motion: {prefers_reduced})");
        Self {
            reduced_motion: prefers_reduced,
            ..Self::default()
        }
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("Settings not persisted (key {})", Self::STORAGE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_disables_animation() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.bowl_dips_enabled());
        assert!(!settings.panel_drops_enabled());
        assert!(Settings::default().bowl_dips_enabled());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"reduced_motion": true}"#).unwrap();
        assert!(settings.reduced_motion);
        assert!(settings.show_energy_values);
    }
}
