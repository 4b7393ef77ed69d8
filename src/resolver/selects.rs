use crate::model::{Field, Machine, Selection};
use crate::normalizer::{ColorKey, is_skip_value, norm_val, normalize_color_key};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub hidden: bool,
}

impl SelectOption {
    fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            hidden: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

/// One `<select>`: its options, current value and enabled state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectState {
    pub options: Vec<SelectOption>,
    pub value: String,
    pub disabled: bool,
    colors: bool,
}

impl SelectState {
    fn values(values: Vec<String>, placeholder: Option<&str>) -> Self {
        let mut options = Vec::new();
        if let Some(p) = placeholder {
            options.push(SelectOption::new("", p));
        }
        options.extend(values.iter().map(|v| SelectOption::new(v, v)));
        Self {
            options,
            ..Default::default()
        }
    }

    fn colors(keys: &[ColorKey]) -> Self {
        Self {
            options: keys.iter().map(|c| SelectOption::new(c.key(), c.label())).collect(),
            colors: true,
            ..Default::default()
        }
    }

    fn matches(&self, option: &str, value: &str) -> bool {
        if self.colors {
            normalize_color_key(option) == normalize_color_key(value)
        } else {
            option == value || norm_val(option) == norm_val(value)
        }
    }

    /// Selects `value` when an option carries it, otherwise clears the select.
    pub fn set(&mut self, value: &str) {
        self.value = self
            .options
            .iter()
            .find(|o| !o.is_placeholder() && self.matches(&o.value, value))
            .map(|o| o.value.clone())
            .unwrap_or_default();
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| !o.is_placeholder() && o.value == value)
    }

    pub fn has_placeholder(&self) -> bool {
        self.options.iter().any(SelectOption::is_placeholder)
    }

    pub fn first_visible(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| !o.is_placeholder() && !o.hidden)
            .map(|o| o.value.as_str())
    }

    pub fn first_option(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| !o.is_placeholder())
            .map(|o| o.value.as_str())
    }

    pub fn current_hidden(&self) -> bool {
        if self.value.is_empty() {
            return false;
        }
        self.options
            .iter()
            .find(|o| o.value == self.value)
            .is_none_or(|o| o.hidden)
    }

    pub fn show_all(&mut self) {
        for o in &mut self.options {
            o.hidden = false;
        }
    }

    pub fn remove_placeholder(&mut self) {
        self.options.retain(|o| !o.is_placeholder());
    }

    pub fn ensure_placeholder(&mut self, label: &str) {
        if !self.has_placeholder() {
            self.options.insert(0, SelectOption::new("", label));
        }
    }

    pub fn visible_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| !o.is_placeholder() && !o.hidden)
            .map(|o| o.value.as_str())
            .collect()
    }
}

pub const FRAME_PLACEHOLDER: &str = "Выберите каркас";
pub const FRIDGE_PLACEHOLDER: &str = "Выберите холодильник";
pub const TERMINAL_PLACEHOLDER: &str = "Выберите терминал";

/// Catalog value a select filters on.
pub fn field_value(m: &Machine, field: Field) -> Option<&str> {
    match field {
        Field::Machine => Some(m.display_model()),
        Field::Frame => m.frame.as_deref(),
        Field::FrameColor => m.frame_color.as_deref(),
        Field::InsertColor => None,
        Field::Fridge => m.refrigerator.as_deref(),
        Field::Terminal => m.terminal.as_deref(),
    }
}

/// Distinct non-placeholder values of a field, in catalog order.
pub fn select_values(machines: &[Machine], field: Field) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for m in machines {
        let Some(v) = field_value(m, field) else {
            continue;
        };
        if is_skip_value(Some(v)) || values.iter().any(|x| x == v) {
            continue;
        }
        values.push(v.to_string());
    }
    values
}

/// All configurator selects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectBoard {
    pub machine: SelectState,
    pub frame: SelectState,
    pub frame_color: SelectState,
    pub insert_color: SelectState,
    pub fridge: SelectState,
    pub terminal: SelectState,
}

impl SelectBoard {
    /// Builds the options from the catalog; every value starts empty.
    pub fn populate(machines: &[Machine]) -> Self {
        Self {
            machine: SelectState::values(select_values(machines, Field::Machine), None),
            frame: SelectState::values(select_values(machines, Field::Frame), Some(FRAME_PLACEHOLDER)),
            frame_color: SelectState::colors(&ColorKey::FRAME),
            insert_color: SelectState::colors(&ColorKey::INSERT),
            fridge: SelectState::values(select_values(machines, Field::Fridge), Some(FRIDGE_PLACEHOLDER)),
            terminal: SelectState::values(
                select_values(machines, Field::Terminal),
                Some(TERMINAL_PLACEHOLDER),
            ),
        }
    }

    pub fn get(&self, field: Field) -> &SelectState {
        match field {
            Field::Machine => &self.machine,
            Field::Frame => &self.frame,
            Field::FrameColor => &self.frame_color,
            Field::InsertColor => &self.insert_color,
            Field::Fridge => &self.fridge,
            Field::Terminal => &self.terminal,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut SelectState {
        match field {
            Field::Machine => &mut self.machine,
            Field::Frame => &mut self.frame,
            Field::FrameColor => &mut self.frame_color,
            Field::InsertColor => &mut self.insert_color,
            Field::Fridge => &mut self.fridge,
            Field::Terminal => &mut self.terminal,
        }
    }

    pub fn value(&self, field: Field) -> &str {
        &self.get(field).value
    }

    pub fn set(&mut self, field: Field, value: &str) {
        self.get_mut(field).set(value);
    }

    pub fn selection(&self) -> Selection {
        Selection {
            machine: self.machine.value.clone(),
            frame: self.frame.value.clone(),
            frame_color: self.frame_color.value.clone(),
            insert_color: self.insert_color.value.clone(),
            fridge: self.fridge.value.clone(),
            terminal: self.terminal.value.clone(),
        }
    }

    pub fn apply(&mut self, selection: &Selection) {
        for field in [
            Field::Machine,
            Field::Frame,
            Field::FrameColor,
            Field::InsertColor,
            Field::Fridge,
            Field::Terminal,
        ] {
            self.set(field, selection.get(field));
        }
    }
}
