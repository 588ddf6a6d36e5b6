//! Answer tiles and the shaping of external answer input
//!
//! The questionnaire owns the authoritative answer list and the calculator
//! owns the energy numbers. This module turns both into tiles the scale can
//! weigh and lay out, filling gaps with defaults until real values arrive.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_ENERGY;
use crate::error::Rejection;

pub type AnswerId = u64;

/// One selected answer as the questionnaire reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub id: AnswerId,
    pub question_index: u32,
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Authoritative energy, if the calculator has priced this answer
    #[serde(default)]
    pub energy: Option<f32>,
    /// The answer still has user-fillable parameters without values
    #[serde(default)]
    pub has_open_parameters: bool,
}

/// An answer resting in the right bowl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerTile {
    pub answer_id: AnswerId,
    pub question_index: u32,
    pub image_ref: Option<String>,
    pub energy_value: f32,
    /// Only answers of the current question can be removed
    pub removable: bool,
    /// `energy_value` is a placeholder awaiting the calculator
    pub energy_is_default: bool,
    pub has_open_parameters: bool,
}

/// Placeholder energy for an answer without a calculated value
#[inline]
pub fn default_energy(has_open_parameters: bool) -> f32 {
    if has_open_parameters {
        0.0
    } else {
        DEFAULT_ENERGY
    }
}

impl AnswerTile {
    pub fn from_input(input: AnswerInput, current_question: u32) -> Self {
        let (energy_value, energy_is_default) = match input.energy {
            Some(e) if e.is_finite() => (e.max(0.0), false),
            _ => (default_energy(input.has_open_parameters), true),
        };
        Self {
            answer_id: input.id,
            question_index: input.question_index,
            image_ref: input.image_ref,
            energy_value,
            removable: input.question_index == current_question,
            energy_is_default,
            has_open_parameters: input.has_open_parameters,
        }
    }
}

/// Energy figures from one calculator response, applied as a unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub total_energy: f32,
    #[serde(default)]
    pub per_answer: HashMap<AnswerId, f32>,
}

/// Limits the questionnaire places on the current question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRule {
    pub max_answers: usize,
}

impl Default for SelectionRule {
    fn default() -> Self {
        Self { max_answers: 1 }
    }
}

/// A dragged or clicked answer, as serialized by the answer picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPayload {
    pub id: AnswerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub energy: Option<f32>,
    #[serde(default)]
    pub variables: Vec<serde_json::Value>,
    #[serde(default)]
    pub variable_values: Vec<serde_json::Value>,
}

impl DropPayload {
    pub fn parse(json: &str) -> Result<Self, Rejection> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether some declared variable has no value yet
    pub fn has_open_parameters(&self) -> bool {
        let filled = self
            .variable_values
            .iter()
            .filter(|v| !v.is_null())
            .count();
        filled < self.variables.len()
    }

    pub fn into_input(self, question_index: u32) -> AnswerInput {
        let has_open_parameters = self.has_open_parameters();
        AnswerInput {
            id: self.id,
            question_index,
            image_ref: self.image,
            energy: self.energy,
            has_open_parameters,
        }
    }
}

/// Ordered collection of tiles on the scale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    tiles: Vec<AnswerTile>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tiles(&self) -> &[AnswerTile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, id: AnswerId, question_index: u32) -> Option<&AnswerTile> {
        self.tiles
            .iter()
            .find(|t| t.answer_id == id && t.question_index == question_index)
    }

    /// Replace the whole set with the questionnaire's list
    ///
    /// Energies already known for a tile survive when the new input carries
    /// none, so a resend of the list does not reset priced answers to
    /// defaults. Returns whether membership changed.
    pub fn replace_all(&mut self, inputs: Vec<AnswerInput>, current_question: u32) -> bool {
        let previous = std::mem::take(&mut self.tiles);
        let mut changed = previous.len() != inputs.len();

        for input in inputs {
            let known = previous
                .iter()
                .find(|t| t.answer_id == input.id && t.question_index == input.question_index);
            if known.is_none() {
                changed = true;
            }
            let mut tile = AnswerTile::from_input(input, current_question);
            if let Some(known) = known {
                if tile.energy_is_default && !known.energy_is_default {
                    tile.energy_value = known.energy_value;
                    tile.energy_is_default = false;
                }
            }
            self.tiles.push(tile);
        }
        changed
    }

    /// Check the selection rule for an answer offered to the current question
    pub fn check_offer(
        &self,
        id: AnswerId,
        current_question: u32,
        rule: SelectionRule,
    ) -> Result<(), Rejection> {
        if self.get(id, current_question).is_some() {
            return Err(Rejection::Duplicate(id));
        }
        let held = self
            .tiles
            .iter()
            .filter(|t| t.question_index == current_question)
            .count();
        if held >= rule.max_answers {
            return Err(Rejection::Capacity {
                question: current_question,
                max: rule.max_answers,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, tile: AnswerTile) {
        self.tiles.push(tile);
    }

    /// Remove a tile of the given question; returns it if present
    pub fn remove(&mut self, id: AnswerId, question_index: u32) -> Option<AnswerTile> {
        let pos = self
            .tiles
            .iter()
            .position(|t| t.answer_id == id && t.question_index == question_index)?;
        Some(self.tiles.remove(pos))
    }

    /// Overwrite energies with authoritative values; unknown ids are ignored
    pub fn apply_energies(&mut self, per_answer: &HashMap<AnswerId, f32>) {
        for tile in &mut self.tiles {
            if let Some(&e) = per_answer.get(&tile.answer_id) {
                if e.is_finite() {
                    tile.energy_value = e.max(0.0);
                    tile.energy_is_default = false;
                }
            }
        }
    }

    pub fn refresh_removable(&mut self, current_question: u32) {
        for tile in &mut self.tiles {
            tile.removable = tile.question_index == current_question;
        }
    }

    pub fn total_energy(&self) -> f32 {
        self.tiles.iter().map(|t| t.energy_value).sum()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: AnswerId, q: u32) -> AnswerInput {
        AnswerInput {
            id,
            question_index: q,
            image_ref: None,
            energy: None,
            has_open_parameters: false,
        }
    }

    #[test]
    fn test_missing_energy_defaults() {
        let plain = AnswerTile::from_input(input(1, 0), 0);
        assert_eq!(plain.energy_value, DEFAULT_ENERGY);
        assert!(plain.energy_is_default);

        let open = AnswerTile::from_input(
            AnswerInput {
                has_open_parameters: true,
                ..input(2, 0)
            },
            0,
        );
        assert_eq!(open.energy_value, 0.0);
    }

    #[test]
    fn test_authoritative_energy_replaces_default() {
        let mut set = AnswerSet::new();
        set.replace_all(vec![input(1, 0), input(2, 1)], 1);
        assert_eq!(set.total_energy(), 2.0);

        let per_answer = HashMap::from([(1, 42.0), (99, 5.0)]);
        set.apply_energies(&per_answer);
        assert_eq!(set.total_energy(), 43.0);
        assert!(!set.tiles()[0].energy_is_default);
        assert!(set.tiles()[1].energy_is_default);
    }

    #[test]
    fn test_resend_keeps_priced_energy() {
        let mut set = AnswerSet::new();
        set.replace_all(vec![input(1, 0)], 0);
        set.apply_energies(&HashMap::from([(1, 12.5)]));
        let changed = set.replace_all(vec![input(1, 0)], 0);
        assert!(!changed);
        assert_eq!(set.tiles()[0].energy_value, 12.5);
    }

    #[test]
    fn test_selection_rule() {
        let mut set = AnswerSet::new();
        set.replace_all(vec![input(1, 3)], 3);
        let rule = SelectionRule { max_answers: 2 };

        assert_eq!(set.check_offer(1, 3, rule), Err(Rejection::Duplicate(1)));
        assert_eq!(set.check_offer(2, 3, rule), Ok(()));

        set.push(AnswerTile::from_input(input(2, 3), 3));
        assert_eq!(
            set.check_offer(4, 3, rule),
            Err(Rejection::Capacity { question: 3, max: 2 })
        );
        // Same answer id under another question is a different tile
        assert_eq!(set.check_offer(1, 4, rule), Ok(()));
    }

    #[test]
    fn test_removable_tracks_current_question() {
        let mut set = AnswerSet::new();
        set.replace_all(vec![input(1, 0), input(2, 1)], 1);
        assert!(!set.tiles()[0].removable);
        assert!(set.tiles()[1].removable);
        set.refresh_removable(0);
        assert!(set.tiles()[0].removable);
        assert!(!set.tiles()[1].removable);
    }

    #[test]
    fn test_drop_payload_parse() {
        let p = DropPayload::parse(
            r#"{"id": 7, "name": "Bike", "image": "bike.png",
                "variables": [{"name": "km"}], "variableValues": [null]}"#,
        )
        .unwrap();
        assert_eq!(p.id, 7);
        assert!(p.has_open_parameters());

        let input = p.into_input(2);
        assert_eq!(input.question_index, 2);
        assert_eq!(input.image_ref.as_deref(), Some("bike.png"));
    }

    #[test]
    fn test_drop_payload_malformed() {
        assert!(matches!(
            DropPayload::parse("{\"name\": \"no id\"}"),
            Err(Rejection::Malformed(_))
        ));
        assert!(matches!(DropPayload::parse(""), Err(Rejection::Malformed(_))));
    }
}
