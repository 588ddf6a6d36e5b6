//! JS bindings for the questionnaire page
//!
//! The page owns the animation loop: it calls [`ScaleHandle::tick`] from
//! `requestAnimationFrame` and draws whatever frame comes back.

use wasm_bindgen::prelude::*;

use crate::answers::AnswerId;
use crate::settings::Settings;
use crate::sim::{ExternalUpdate, FrameSnapshot, Scale};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    super::init_logging();
    log::info!("Energy scale module loaded");
}

fn answer_id(value: f64) -> Result<AnswerId, JsError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as AnswerId)
    } else {
        Err(JsError::new(&format!("invalid answer id {value}")))
    }
}

/// A scale instance exposed to JS
#[wasm_bindgen]
pub struct ScaleHandle {
    scale: Scale,
}

impl ScaleHandle {
    fn update_settings(&mut self, edit: impl FnOnce(&mut Settings)) {
        let mut settings = self.scale.settings().clone();
        edit(&mut settings);
        settings.save();
        self.scale.set_settings(settings);
    }
}

#[wasm_bindgen]
impl ScaleHandle {
    /// Create a scale, optionally overriding tuning with a JSON object
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> ScaleHandle {
        let tuning = match tuning_json.as_deref().map(Tuning::from_json) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("Falling back to default tuning: {e}");
                Tuning::default()
            }
            None => Tuning::default(),
        };

        let mut scale = Scale::new(tuning, Settings::load());
        if let Some(width) = super::viewport_width() {
            scale.set_viewport_width(width);
        }
        ScaleHandle { scale }
    }

    /// Advance by `dt_ms` and pass the frame to `on_frame` as JSON
    pub fn tick(&mut self, dt_ms: f64, on_frame: &js_sys::Function) {
        let mut sink = |frame: &FrameSnapshot| match serde_json::to_string(frame) {
            Ok(json) => {
                if let Err(e) = on_frame.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::warn!("Frame callback threw: {e:?}");
                }
            }
            Err(e) => log::error!("Frame serialization failed: {e}"),
        };
        self.scale.tick((dt_ms / 1000.0) as f32, &mut sink);
    }

    /// Last presented frame as JSON
    pub fn frame_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.scale.last_frame())?)
    }

    /// Queue an `{answers, energies, panelTarget}` update for the next tick
    pub fn submit_json(&mut self, json: &str) -> Result<(), JsError> {
        let update: ExternalUpdate = serde_json::from_str(json)?;
        self.scale.submit(update);
        Ok(())
    }

    /// Offer a dragged answer; returns whether it was accepted
    pub fn offer_drop(&mut self, payload: &str) -> bool {
        self.scale.offer_drop(payload).is_ok()
    }

    pub fn request_removal(&mut self, id: f64) -> Result<(), JsError> {
        self.scale.request_removal(answer_id(id)?)?;
        Ok(())
    }

    pub fn set_panel_target(&mut self, target: f64) {
        let target = if target.is_finite() { target.round() as i64 } else { 0 };
        self.scale.set_panel_target(target);
    }

    pub fn set_max_answers(&mut self, max: u32) {
        self.scale.set_selection_rule(crate::answers::SelectionRule {
            max_answers: max as usize,
        });
    }

    pub fn change_question(&mut self, question: u32) {
        self.scale.change_question(question);
    }

    pub fn restart(&mut self) {
        self.scale.restart();
    }

    pub fn teardown(&mut self) {
        self.scale.teardown();
    }

    pub fn cancel_pending(&mut self) {
        self.scale.cancel_pending();
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.scale.set_viewport_width(width);
    }

    /// Re-measure the browser viewport (call from a resize listener)
    pub fn measure_viewport(&mut self) {
        if let Some(width) = super::viewport_width() {
            self.scale.set_viewport_width(width);
        }
    }

    pub fn set_reduced_motion(&mut self, enabled: bool) {
        self.update_settings(|s| s.reduced_motion = enabled);
    }

    pub fn set_show_energy_values(&mut self, enabled: bool) {
        self.update_settings(|s| s.show_energy_values = enabled);
    }

    pub fn set_show_equilibrium(&mut self, enabled: bool) {
        self.update_settings(|s| s.show_equilibrium = enabled);
    }

    /// Current preferences as JSON
    pub fn settings_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.scale.settings())?)
    }

    /// Events since the last drain, as a JSON array
    pub fn drain_events(&mut self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.scale.drain_events())?)
    }
}
