// Colour keys, skip values and value normalization
use std::fmt;

/// Canonical colour token used as a key in `design_images`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorKey {
    White,
    Black,
    Yellow,
    Green,
    Red,
    Gray,
    Blue,
    Purple,
}

impl ColorKey {
    pub const ALL: [ColorKey; 8] = [
        ColorKey::White,
        ColorKey::Black,
        ColorKey::Yellow,
        ColorKey::Green,
        ColorKey::Red,
        ColorKey::Gray,
        ColorKey::Blue,
        ColorKey::Purple,
    ];

    pub const FRAME: [ColorKey; 2] = [ColorKey::White, ColorKey::Black];

    pub const INSERT: [ColorKey; 6] = [
        ColorKey::Yellow,
        ColorKey::Green,
        ColorKey::Red,
        ColorKey::Gray,
        ColorKey::Blue,
        ColorKey::Purple,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ColorKey::White => "white",
            ColorKey::Black => "black",
            ColorKey::Yellow => "yellow",
            ColorKey::Green => "green",
            ColorKey::Red => "red",
            ColorKey::Gray => "gray",
            ColorKey::Blue => "blue",
            ColorKey::Purple => "purple",
        }
    }

    /// Label shown in the colour selects.
    pub fn label(&self) -> &'static str {
        match self {
            ColorKey::White => "Белый",
            ColorKey::Black => "Чёрный",
            ColorKey::Yellow => "Жёлтый",
            ColorKey::Green => "Зелёный",
            ColorKey::Red => "Красный",
            ColorKey::Gray => "Серый",
            ColorKey::Blue => "Синий",
            ColorKey::Purple => "Фиолетовый",
        }
    }

    /// Spellings found in stored data, all lowercase.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            ColorKey::White => &["white", "белый", "белая", "бел"],
            ColorKey::Black => &["black", "чёрный", "черный", "черная", "чёрная"],
            ColorKey::Yellow => &["yellow", "желтый", "жёлтый", "желтая", "жёлтая"],
            ColorKey::Green => &["green", "зеленый", "зелёный", "зеленая", "зелёная"],
            ColorKey::Red => &["red", "красный", "красная"],
            ColorKey::Gray => &["gray", "grey", "серый", "серая"],
            ColorKey::Blue => &["blue", "синий", "синяя"],
            ColorKey::Purple => &["purple", "фиолетовый", "фиолетовая"],
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let k = norm_val(raw);
        Self::ALL
            .into_iter()
            .find(|c| c.synonyms().contains(&k.as_str()))
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Maps any colour spelling to its canonical key.
///
/// Unknown input comes back trimmed and lowercased, so the result is always
/// safe to compare against another normalized key.
pub fn normalize_color_key(raw: &str) -> String {
    match ColorKey::parse(raw) {
        Some(color) => color.key().to_string(),
        None => norm_val(raw),
    }
}

/// Label for a colour select option; unknown keys are shown as-is.
pub fn color_label(raw: &str) -> String {
    ColorKey::parse(raw)
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn norm_val(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn norm_opt(raw: Option<&str>) -> String {
    raw.map(norm_val).unwrap_or_default()
}

/// Placeholder-like catalog values that never become select options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipValue {
    Empty,
    Net,
    Ne,
    Dash,
    None,
}

impl SkipValue {
    pub const ALL: [SkipValue; 5] = [
        SkipValue::Empty,
        SkipValue::Net,
        SkipValue::Ne,
        SkipValue::Dash,
        SkipValue::None,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            SkipValue::Empty => "",
            SkipValue::Net => "нет",
            SkipValue::Ne => "не",
            SkipValue::Dash => "-",
            SkipValue::None => "none",
        }
    }
}

pub fn is_skip_value(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(v) => {
            let v = norm_val(v);
            SkipValue::ALL.iter().any(|s| s.token() == v)
        }
    }
}

/// True when a frame select value means "no frame".
pub fn is_no_frame(raw: &str) -> bool {
    matches!(norm_val(raw).as_str(), "" | "нет" | "no" | "none")
}
