//! Energy Scale entry point
//!
//! On the web the questionnaire page drives the scale through the library's
//! JS bindings. Natively this runs a scripted, seeded questionnaire session
//! headless and logs what the scale does.

#[cfg(not(target_arch = "wasm32"))]
mod session {
    use std::collections::HashMap;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use energy_scale::answers::{AnswerId, AnswerInput, CalculationResult, SelectionRule};
    use energy_scale::consts::REFERENCE_HZ;
    use energy_scale::{ExternalUpdate, FrameSnapshot, RenderSink, Scale, ScaleEvent, Settings, Tuning};

    const QUESTIONS: u32 = 5;
    const SECONDS_PER_QUESTION: f32 = 8.0;

    /// A calculator response still in transit
    struct PendingCalc {
        due: f32,
        update: ExternalUpdate,
    }

    /// Logs one line per simulated second
    #[derive(Default)]
    struct SummarySink {
        frames: u64,
        max_tilt: f32,
    }

    impl RenderSink for SummarySink {
        fn present(&mut self, frame: &FrameSnapshot) {
            self.frames += 1;
            self.max_tilt = self.max_tilt.max(frame.beam_angle.abs());
            if frame.tick % REFERENCE_HZ as u64 == 0 {
                log::info!(
                    "t={:>3}s angle {:>6.2} (eq {:>6.2}) mass L {:>6.1} R {:>6.1} panels {} tiles {}",
                    frame.tick / REFERENCE_HZ as u64,
                    frame.beam_angle,
                    frame.equilibrium_angle,
                    frame.left_mass,
                    frame.right_mass,
                    frame.settled_panel_count,
                    frame.right_slots.len(),
                );
            }
        }
    }

    fn log_event(event: &ScaleEvent) {
        match event {
            ScaleEvent::AnswerAdded(tile) => log::info!(
                "Answer {} added to question {} ({:.1} kWh)",
                tile.answer_id,
                tile.question_index,
                tile.energy_value
            ),
            ScaleEvent::DropRejected(reason) => log::info!("Drop rejected: {reason}"),
            ScaleEvent::RemovalRequested(id) => log::info!("Removal requested for {id}"),
            ScaleEvent::PanelSettled(id) => log::debug!("Panel {id} settled"),
            ScaleEvent::PanelRemoved(id) => log::debug!("Panel {id} removed"),
        }
    }

    /// What the energy calculator would answer for the current tiles
    fn calculate(scale: &Scale, prices: &HashMap<AnswerId, f32>) -> ExternalUpdate {
        let answers: Vec<AnswerInput> = scale
            .tiles()
            .iter()
            .map(|t| AnswerInput {
                id: t.answer_id,
                question_index: t.question_index,
                image_ref: t.image_ref.clone(),
                energy: None,
                has_open_parameters: t.has_open_parameters,
            })
            .collect();
        let per_answer: HashMap<AnswerId, f32> = answers
            .iter()
            .map(|a| (a.id, prices.get(&a.id).copied().unwrap_or(0.0)))
            .collect();
        let total_energy = per_answer.values().sum();

        ExternalUpdate {
            answers: Some(answers),
            energies: Some(CalculationResult {
                total_energy,
                per_answer,
            }),
            panel_target: None,
        }
    }

    pub fn run(seed: u64) {
        log::info!("Headless session with seed {seed}");
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut scale = Scale::new(Tuning::default(), Settings::load());
        let mut sink = SummarySink::default();

        let dt = 1.0 / REFERENCE_HZ;
        let mut clock = 0.0_f32;
        let mut in_transit: Vec<PendingCalc> = Vec::new();
        let mut prices: HashMap<AnswerId, f32> = HashMap::new();
        let mut next_id: AnswerId = 1;

        for question in 0..QUESTIONS {
            scale.change_question(question);
            let max_answers = rng.random_range(1..=3);
            scale.set_selection_rule(SelectionRule { max_answers });

            let question_end = clock + SECONDS_PER_QUESTION;
            let mut next_pick = clock + rng.random_range(0.3..1.0);
            // One more attempt than allowed, to exercise the capacity check
            let mut attempts = 0;

            while clock < question_end {
                if clock >= next_pick && attempts <= max_answers {
                    attempts += 1;
                    next_pick = clock + rng.random_range(0.5..2.0);

                    let id = next_id;
                    next_id += 1;
                    let payload = serde_json::json!({
                        "id": id,
                        "name": format!("answer-{id}"),
                        "image": format!("answers/{id}.png"),
                    });
                    if scale.offer_drop(&payload.to_string()).is_ok() {
                        prices.insert(id, rng.random_range(2.0..40.0));
                        in_transit.push(PendingCalc {
                            due: clock + rng.random_range(0.2..1.2),
                            update: calculate(&scale, &prices),
                        });
                    }
                }

                let (arrived, later): (Vec<_>, Vec<_>) =
                    in_transit.into_iter().partition(|c| c.due <= clock);
                in_transit = later;
                for calc in arrived {
                    scale.submit(calc.update);
                }

                scale.tick(dt, &mut sink);
                clock += dt;

                for event in scale.drain_events() {
                    log_event(&event);
                }
            }
        }

        scale.teardown();
        log::info!(
            "Session finished after {} frames: {} tiles, largest tilt {:.2} deg",
            sink.frames,
            scale.tiles().len(),
            sink.max_tilt
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    energy_scale::platform::init_logging();
    log::info!("Energy Scale (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    session::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
