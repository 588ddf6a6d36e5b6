//! Deterministic placement of answer tiles and settled panels
//!
//! Tiles are grouped by question. Groups are renumbered densely (0, 1, 2, ...)
//! in question order before any position is computed, so a question with no
//! answers never leaves a hole in the grid. A group with several answers
//! shows its first tile plus a count badge; the rest stay hidden until the
//! group shrinks back to one.
//!
//! All coordinates are relative to the owning bowl's anchor.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerId, AnswerTile};
use crate::consts::*;

/// Responsive layout mode derived from the host's measured width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewportClass {
    #[default]
    Normal,
    Narrow,
    VeryNarrow,
}

impl ViewportClass {
    pub fn from_width(width: f32) -> Self {
        if width <= VERY_NARROW_MAX_WIDTH {
            ViewportClass::VeryNarrow
        } else if width <= NARROW_MAX_WIDTH {
            ViewportClass::Narrow
        } else {
            ViewportClass::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewportClass::Normal => "normal",
            ViewportClass::Narrow => "narrow",
            ViewportClass::VeryNarrow => "very-narrow",
        }
    }

    /// Vertical shift applied to every tile in this mode
    fn tile_y_offset(&self) -> f32 {
        match self {
            ViewportClass::Normal | ViewportClass::Narrow => -28.0,
            ViewportClass::VeryNarrow => -45.0,
        }
    }
}

/// Where a placed tile is drawn (tile center)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSlot {
    pub position: Vec2,
    /// Dense group index the tile was placed from
    pub group: usize,
    /// Anchor of the remove button, for removable tiles only
    pub remove_button: Option<Vec2>,
}

/// Count badge drawn on a stacked group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupBadge {
    pub group: usize,
    pub question_index: u32,
    pub count: usize,
    pub position: Vec2,
}

/// Result of one layout pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Keyed by (question, answer); one answer may sit under several questions
    pub tiles: BTreeMap<(u32, AnswerId), LayoutSlot>,
    /// Stacked tiles that are not drawn, as (question, answer)
    pub hidden: Vec<(u32, AnswerId)>,
    pub badges: Vec<GroupBadge>,
    /// Settled panel slots, in settle order
    pub panels: Vec<Vec2>,
}

impl Layout {
    /// First placed slot of an answer, whatever its question
    pub fn slot(&self, id: AnswerId) -> Option<&LayoutSlot> {
        self.tiles
            .iter()
            .find(|((_, answer), _)| *answer == id)
            .map(|(_, slot)| slot)
    }

    pub fn slot_of(&self, tile: &AnswerTile) -> Option<&LayoutSlot> {
        self.tiles.get(&(tile.question_index, tile.answer_id))
    }
}

/// Tiles of one question, in input order
struct Group<'a> {
    question_index: u32,
    members: Vec<&'a AnswerTile>,
}

fn group_tiles(tiles: &[AnswerTile]) -> Vec<Group<'_>> {
    let mut by_question: BTreeMap<u32, Vec<&AnswerTile>> = BTreeMap::new();
    for tile in tiles {
        by_question.entry(tile.question_index).or_default().push(tile);
    }
    by_question
        .into_iter()
        .map(|(question_index, members)| Group {
            question_index,
            members,
        })
        .collect()
}

/// Dense group index of every tile, in input order
pub fn dense_group_indices(tiles: &[AnswerTile]) -> Vec<usize> {
    let dense: BTreeMap<u32, usize> = group_tiles(tiles)
        .iter()
        .enumerate()
        .map(|(i, g)| (g.question_index, i))
        .collect();
    tiles
        .iter()
        .map(|t| dense.get(&t.question_index).copied().unwrap_or(0))
        .collect()
}

/// Grid cell of a dense group index
#[inline]
fn cell(group: usize) -> (f32, f32) {
    ((group % TILE_COLS) as f32, (group / TILE_COLS) as f32)
}

fn tile_position(group: usize, viewport: ViewportClass) -> Vec2 {
    let (col, row) = cell(group);
    let y_offset = viewport.tile_y_offset();
    match viewport {
        ViewportClass::Normal => {
            let pitch = TILE_W + TILE_GAP;
            let x_start = -((TILE_COLS - 1) as f32 * pitch) / 2.0;
            Vec2::new(
                x_start + col * pitch,
                RIM_Y - row * (TILE_H + TILE_GAP) + y_offset,
            )
        }
        ViewportClass::Narrow | ViewportClass::VeryNarrow => Vec2::new(
            -123.0 + 62.0 * (col + 1.0),
            y_offset - 50.0 * (row + 1.0) - 15.0,
        ),
    }
}

fn badge_position(group: usize, tile: Vec2, viewport: ViewportClass) -> Vec2 {
    match viewport {
        ViewportClass::Normal => Vec2::new(tile.x - TILE_W / 2.0 + 8.0, tile.y - TILE_H / 2.0),
        ViewportClass::Narrow | ViewportClass::VeryNarrow => {
            let (col, row) = cell(group);
            let lift = if viewport == ViewportClass::VeryNarrow {
                10.0
            } else {
                0.0
            };
            Vec2::new(
                -160.0 + 66.0 * (col + 1.0),
                RIM_Y - 51.0 * (row + 1.0) - 7.0 + lift,
            )
        }
    }
}

fn remove_button_position(tile: Vec2, viewport: ViewportClass) -> Vec2 {
    match viewport {
        ViewportClass::Normal => tile + Vec2::new(24.0, -20.0),
        ViewportClass::Narrow | ViewportClass::VeryNarrow => tile + Vec2::new(23.0, -21.0),
    }
}

/// Row-major panel grid centered in the rim band, rows stacking upward
pub fn panel_slot(index: usize) -> Vec2 {
    let usable = RIM_W - 2.0 * GRID_MARGIN;
    let pitch = PANEL_W + PANEL_GAP;
    let cols = (((usable + PANEL_GAP) / pitch).floor() as usize).max(1);
    let x_start = -((cols - 1) as f32 * pitch) / 2.0;
    let (col, row) = (index % cols, index / cols);
    Vec2::new(
        x_start + col as f32 * pitch,
        RIM_Y - row as f32 * (PANEL_H + PANEL_GAP),
    )
}

/// Compute slots for every tile and `settled_panels` panels
pub fn layout(tiles: &[AnswerTile], settled_panels: usize, viewport: ViewportClass) -> Layout {
    let mut out = Layout {
        panels: (0..settled_panels).map(panel_slot).collect(),
        ..Layout::default()
    };

    for (group, g) in group_tiles(tiles).into_iter().enumerate() {
        let Some((first, rest)) = g.members.split_first() else {
            continue;
        };
        let position = tile_position(group, viewport);
        out.tiles.insert(
            (first.question_index, first.answer_id),
            LayoutSlot {
                position,
                group,
                remove_button: first
                    .removable
                    .then(|| remove_button_position(position, viewport)),
            },
        );

        if !rest.is_empty() {
            out.badges.push(GroupBadge {
                group,
                question_index: g.question_index,
                count: g.members.len(),
                position: badge_position(group, position, viewport),
            });
            out.hidden
                .extend(rest.iter().map(|t| (t.question_index, t.answer_id)));
        }
    }

    out
}
