use crate::catalog::Catalog;
use crate::model::{Machine, Selection};
use crate::normalizer::{norm_opt, norm_val, normalize_color_key};
use crate::resolver::image::{has_any_design_for_frame, has_design_for_selection};
use std::collections::HashSet;
use tracing::debug;

/// Variant ids proven to have no renderable image in this session.
///
/// Ids are only ever added; a fresh session starts empty.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    ids: HashSet<i64>,
}

impl ExclusionSet {
    pub fn insert(&mut self, id: i64) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 3 = exact design pair, 2 = design for the frame colour, 1 = any plain image.
pub fn variant_score(v: &Machine, frame_color: &str, insert_color: &str) -> u8 {
    if has_design_for_selection(v, frame_color, insert_color) {
        3
    } else if has_any_design_for_frame(v, frame_color) {
        2
    } else if v.has_plain_image() {
        1
    } else {
        0
    }
}

fn field_matches(selected: &str, value: Option<&str>) -> bool {
    selected.is_empty() || norm_val(selected) == norm_opt(value)
}

/// Non-colour fields plus the frame-colour rules of `find_variant`.
pub fn base_filter(v: &Machine, selection: &Selection) -> bool {
    if !field_matches(&selection.machine, Some(v.display_model()))
        || !field_matches(&selection.frame, v.frame.as_deref())
        || !field_matches(&selection.fridge, v.refrigerator.as_deref())
        || !field_matches(&selection.terminal, v.terminal.as_deref())
    {
        return false;
    }

    if selection.frame_color.is_empty() {
        return true;
    }
    let target = normalize_color_key(&selection.frame_color);

    let Some(designs) = v.designs() else {
        return false;
    };
    let has_color_with_image = designs.frames.iter().any(|f| {
        normalize_color_key(&f.frame_color) == target && f.inserts.iter().any(|(_, cfg)| cfg.is_present())
    });
    if !has_color_with_image {
        return false;
    }

    match v.frame_color.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(explicit) => normalize_color_key(explicit) == target,
        None => true,
    }
}

/// Finds the catalog row that best matches a partial selection.
///
/// Variants that can render the selected design pair win over those with any
/// design for the frame colour, which win over the rest ranked by
/// `variant_score`. Excluded ids are never returned.
pub fn find_variant<'a>(
    catalog: &'a Catalog,
    excluded: &ExclusionSet,
    selection: &Selection,
    allow_empty: bool,
) -> Option<&'a Machine> {
    if selection.machine.is_empty() && allow_empty {
        return None;
    }
    let frame_color = normalize_color_key(&selection.frame_color);
    let insert_color = normalize_color_key(&selection.insert_color);

    let matches_all: Vec<&Machine> = catalog
        .machines
        .iter()
        .filter(|v| !excluded.contains(v.id) && base_filter(v, selection))
        .collect();

    let exact: Vec<&Machine> = matches_all
        .iter()
        .copied()
        .filter(|v| has_design_for_selection(v, &frame_color, &insert_color))
        .collect();
    let frame_level: Vec<&Machine> = matches_all
        .iter()
        .copied()
        .filter(|v| has_any_design_for_frame(v, &frame_color))
        .collect();

    debug!(
        "🔍 Candidate variants: selection={:?} matches={:?} pair={:?} frame={:?}",
        selection,
        matches_all.iter().map(|v| v.id).collect::<Vec<_>>(),
        exact.iter().map(|v| v.id).collect::<Vec<_>>(),
        frame_level.iter().map(|v| v.id).collect::<Vec<_>>()
    );

    if let Some(v) = exact.first().or(frame_level.first()) {
        return Some(*v);
    }

    if matches_all.is_empty() {
        return if allow_empty {
            None
        } else {
            catalog.machines.iter().find(|v| !excluded.contains(v.id))
        };
    }

    let mut scored: Vec<(u8, &Machine)> = matches_all
        .into_iter()
        .map(|v| (variant_score(v, &frame_color, &insert_color), v))
        .collect();
    // stable: ties keep catalog order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.first().map(|(_, v)| *v)
}
