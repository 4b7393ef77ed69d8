use crate::model::{Field, Machine, Selection};
use crate::normalizer::{is_skip_value, norm_opt, norm_val, normalize_color_key};
use crate::resolver::selects::{SelectBoard, field_value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Upper bound on compute-and-reset passes.
pub const MAX_CASCADE_ITERATIONS: usize = 5;

/// Selects whose options depend on the others, in reset order.
pub const DEPENDENT_FIELDS: [Field; 4] = [Field::Frame, Field::Fridge, Field::Terminal, Field::FrameColor];

/// Fixed values the catalog rows must match; empty means unconstrained.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filters<'a> {
    pub machine: &'a str,
    pub frame: &'a str,
    pub fridge: &'a str,
    pub terminal: &'a str,
}

impl<'a> Filters<'a> {
    /// Filters for `target`: every other non-colour field of the selection.
    pub fn for_target(selection: &'a Selection, target: Field) -> Self {
        let pick = |field: Field| -> &'a str {
            if field == target {
                ""
            } else {
                selection.get(field)
            }
        };
        Self {
            machine: pick(Field::Machine),
            frame: pick(Field::Frame),
            fridge: pick(Field::Fridge),
            terminal: pick(Field::Terminal),
        }
    }

    pub fn matches(&self, m: &Machine) -> bool {
        let ok = |want: &str, have: Option<&str>| want.is_empty() || norm_val(want) == norm_opt(have);
        ok(self.machine, Some(m.display_model()))
            && ok(self.frame, m.frame.as_deref())
            && ok(self.fridge, m.refrigerator.as_deref())
            && ok(self.terminal, m.terminal.as_deref())
    }
}

/// Normalized values of `field` among rows matching `filters`.
pub fn available_values(machines: &[Machine], field: Field, filters: &Filters<'_>) -> HashSet<String> {
    machines
        .iter()
        .filter(|m| filters.matches(m))
        .filter_map(|m| field_value(m, field))
        .filter(|v| !is_skip_value(Some(*v)))
        .map(norm_val)
        .collect()
}

/// Frame colour keys that matching rows can render.
pub fn available_frame_colors(machines: &[Machine], filters: &Filters<'_>) -> HashSet<String> {
    let mut available = HashSet::new();
    for m in machines.iter().filter(|m| filters.matches(m)) {
        let Some(designs) = m.designs() else {
            continue;
        };
        for frame in &designs.frames {
            let key = normalize_color_key(&frame.frame_color);
            if !key.is_empty() && frame.inserts.iter().any(|(_, cfg)| cfg.is_present()) {
                available.insert(key);
            }
        }
    }
    available
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub iterations: usize,
    pub converged: bool,
}

impl SelectBoard {
    /// Recomputes the options of `field` from the other selects.
    pub fn refresh_availability(&mut self, machines: &[Machine], field: Field) {
        let selection = self.selection();
        let filters = Filters::for_target(&selection, field);

        if field == Field::FrameColor {
            let available = available_frame_colors(machines, &filters);
            let select = self.get_mut(field);
            if available.is_empty() {
                select.show_all();
                return;
            }
            for o in select.options.iter_mut().filter(|o| !o.is_placeholder()) {
                o.hidden = !available.contains(&normalize_color_key(&o.value));
            }
            return;
        }

        let available = available_values(machines, field, &filters);
        for o in self.get_mut(field).options.iter_mut().filter(|o| !o.is_placeholder()) {
            o.hidden = !available.contains(&norm_val(&o.value));
        }
    }

    /// Moves a hidden current value to the first visible option, or clears it.
    pub fn reset_hidden(&mut self, field: Field) -> bool {
        let select = self.get_mut(field);
        if !select.current_hidden() {
            return false;
        }
        let next = select.first_visible().unwrap_or_default().to_string();
        debug!("🔄 Reset {:?} from {:?} to {:?}", field, select.value, next);
        select.value = next;
        true
    }

    /// One pass over the dependent selects. Returns whether any value moved.
    fn cascade_pass(&mut self, machines: &[Machine], pinned: Option<Field>) -> bool {
        let mut changed = false;
        for field in DEPENDENT_FIELDS {
            self.refresh_availability(machines, field);
            if pinned != Some(field) && self.reset_hidden(field) {
                changed = true;
            }
        }
        changed
    }

    fn run_passes(&mut self, machines: &[Machine], pinned: Option<Field>, budget: usize) -> CascadeOutcome {
        for iteration in 1..=budget {
            if !self.cascade_pass(machines, pinned) {
                return CascadeOutcome {
                    iterations: iteration,
                    converged: true,
                };
            }
        }
        CascadeOutcome {
            iterations: budget,
            converged: false,
        }
    }

    /// Cascading filter: refresh every dependent select and reset hidden
    /// values until nothing changes.
    ///
    /// `pinned` is the select the user just changed. The other selects adapt
    /// to it first; if it is still hidden once they settle, it falls back to
    /// its first visible option and one more pass runs.
    pub fn update_available_options(&mut self, machines: &[Machine], pinned: Option<Field>) -> CascadeOutcome {
        if machines.is_empty() {
            return CascadeOutcome {
                iterations: 0,
                converged: true,
            };
        }

        let mut outcome = self.run_passes(machines, pinned, MAX_CASCADE_ITERATIONS);

        if let Some(field) = pinned.filter(|f| DEPENDENT_FIELDS.contains(f)) {
            self.refresh_availability(machines, field);
            if self.reset_hidden(field) && outcome.iterations < MAX_CASCADE_ITERATIONS {
                let extra = self.run_passes(machines, None, 1);
                outcome = CascadeOutcome {
                    iterations: outcome.iterations + extra.iterations,
                    converged: extra.converged,
                };
            }
        }

        if !outcome.converged {
            warn!("⚠️ update_available_options: max iterations reached");
        }
        outcome
    }
}
