// Core structs: Machine, Spec, Selection, lead payloads and error enums
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Image override for one (frame colour, insert colour) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignImageConfig {
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default)]
    pub main_image_path: Option<String>,
    #[serde(default)]
    pub gallery_folder: Option<String>,
}

impl DesignImageConfig {
    /// A config counts only when it points at an image.
    pub fn is_present(&self) -> bool {
        self.image().is_some()
    }

    /// `main_image`, falling back to `main_image_path`.
    pub fn image(&self) -> Option<&str> {
        [self.main_image.as_deref(), self.main_image_path.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

/// Insert colours of one frame colour, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDesigns {
    pub frame_color: String,
    pub inserts: Vec<(String, DesignImageConfig)>,
}

/// `design_images` column: frame colour → insert colour → config.
///
/// Keys keep the order the backend sent them in, because the frame-level
/// fallback picks the first usable insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignImages {
    pub frames: Vec<FrameDesigns>,
}

impl DesignImages {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_colors(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.frame_color.as_str())
    }

    pub fn insert(mut self, frame: &str, insert: &str, config: DesignImageConfig) -> Self {
        match self.frames.iter_mut().find(|f| f.frame_color == frame) {
            Some(entry) => entry.inserts.push((insert.to_string(), config)),
            None => self.frames.push(FrameDesigns {
                frame_color: frame.to_string(),
                inserts: vec![(insert.to_string(), config)],
            }),
        }
        self
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let value = match value {
            Value::Null => return Ok(Self::default()),
            // older rows store the column as a JSON string
            Value::String(raw) if raw.trim().is_empty() => return Ok(Self::default()),
            Value::String(raw) => serde_json::from_str(&raw).map_err(|e| e.to_string())?,
            other => other,
        };
        let Value::Object(frames) = value else {
            return Err("design_images must be an object".into());
        };

        let mut result = Self::default();
        for (frame_color, inserts) in frames {
            let inserts = match inserts {
                Value::Object(map) => map
                    .into_iter()
                    .map(|(insert, cfg)| {
                        let cfg = serde_json::from_value(cfg).unwrap_or_default();
                        (insert, cfg)
                    })
                    .collect(),
                _ => Vec::new(),
            };
            result.frames.push(FrameDesigns {
                frame_color,
                inserts,
            });
        }
        Ok(result)
    }
}

impl Serialize for DesignImages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Inserts<'a>(&'a [(String, DesignImageConfig)]);

        impl Serialize for Inserts<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (key, cfg) in self.0 {
                    map.serialize_entry(key, cfg)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.frames.len()))?;
        for frame in &self.frames {
            map.serialize_entry(&frame.frame_color, &Inserts(&frame.inserts))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DesignImages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// One catalog row: a machine/frame/fridge/terminal combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub frame_color: Option<String>,
    #[serde(default)]
    pub refrigerator: Option<String>,
    #[serde(default)]
    pub terminal: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub ozon_link: Option<String>,
    #[serde(default)]
    pub graphic_link: Option<String>,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default)]
    pub main_image_path: Option<String>,
    #[serde(default)]
    pub gallery_folder: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gallery_files: Vec<String>,
    #[serde(default)]
    pub design_images: Option<DesignImages>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Machine {
    /// Value the machine select shows: `model`, falling back to `name`.
    pub fn display_model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn has_plain_image(&self) -> bool {
        self.main_image.as_deref().is_some_and(|s| !s.is_empty()) || !self.gallery_files.is_empty()
    }

    /// `design_images` when the variant carries any.
    pub fn designs(&self) -> Option<&DesignImages> {
        self.design_images.as_ref().filter(|d| !d.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecCategory {
    CoffeeMachine,
    Frame,
    Refrigerator,
    Terminal,
}

impl SpecCategory {
    pub const ALL: [SpecCategory; 4] = [
        SpecCategory::CoffeeMachine,
        SpecCategory::Frame,
        SpecCategory::Refrigerator,
        SpecCategory::Terminal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecCategory::CoffeeMachine => "coffee_machine",
            SpecCategory::Frame => "frame",
            SpecCategory::Refrigerator => "refrigerator",
            SpecCategory::Terminal => "terminal",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw.trim())
    }

    /// Catalog field a spec of this category describes.
    pub fn value_of<'a>(&self, machine: &'a Machine) -> Option<&'a str> {
        match self {
            SpecCategory::CoffeeMachine => Some(machine.display_model()),
            SpecCategory::Frame => machine.frame.as_deref(),
            SpecCategory::Refrigerator => machine.refrigerator.as_deref(),
            SpecCategory::Terminal => machine.terminal.as_deref(),
        }
    }
}

/// Characteristics of one catalog entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default)]
    pub id: Option<i64>,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub specs_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specs: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Spec {
    /// Text lines, derived from `specs_text` when the list is empty.
    pub fn lines(&self) -> Vec<String> {
        if !self.specs.is_empty() {
            return self.specs.clone();
        }
        self.specs_text
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Body of `GET /api/config-data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub machines: Vec<Machine>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specs: Vec<Spec>,
    #[serde(default, deserialize_with = "version_token")]
    pub version: Option<String>,
}

/// Same token rules as `ConfigVersion`, so both endpoints compare equal.
fn version_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let version = Option::<Value>::deserialize(deserializer)?;
    Ok(ConfigVersion { version }.token())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigVersion {
    #[serde(default)]
    pub version: Option<Value>,
}

impl ConfigVersion {
    /// Version token as text; numbers and strings are both accepted.
    pub fn token(&self) -> Option<String> {
        match self.version.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// The user's current choice; empty fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub machine: String,
    #[serde(default)]
    pub frame: String,
    #[serde(default)]
    pub frame_color: String,
    #[serde(default)]
    pub insert_color: String,
    #[serde(default)]
    pub fridge: String,
    #[serde(default)]
    pub terminal: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Machine,
    Frame,
    FrameColor,
    InsertColor,
    Fridge,
    Terminal,
}

impl Selection {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Machine => &self.machine,
            Field::Frame => &self.frame,
            Field::FrameColor => &self.frame_color,
            Field::InsertColor => &self.insert_color,
            Field::Fridge => &self.fridge,
            Field::Terminal => &self.terminal,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Machine => &mut self.machine,
            Field::Frame => &mut self.frame,
            Field::FrameColor => &mut self.frame_color,
            Field::InsertColor => &mut self.insert_color,
            Field::Fridge => &mut self.fridge,
            Field::Terminal => &mut self.terminal,
        };
        *slot = value.into();
    }
}

/// Variant summary attached to a lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadSelection {
    pub id: i64,
    pub machine: String,
    pub frame: Option<String>,
    pub frame_color: Option<String>,
    pub refrigerator: Option<String>,
    pub terminal: Option<String>,
    pub price: Option<f64>,
    pub ozon_link: Option<String>,
    pub gallery_folder: Option<String>,
}

impl From<&Machine> for LeadSelection {
    fn from(v: &Machine) -> Self {
        Self {
            id: v.id,
            machine: v.display_model().to_string(),
            frame: v.frame.clone(),
            frame_color: v.frame_color.clone(),
            refrigerator: v.refrigerator.clone(),
            terminal: v.terminal.clone(),
            price: v.price,
            ozon_link: v.ozon_link.clone(),
            gallery_folder: v.gallery_folder.clone(),
        }
    }
}

/// Body of `POST /api/lead`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRequest {
    pub name: String,
    pub phone: String,
    pub telegram: String,
    pub email: String,
    pub selection: Option<LeadSelection>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Builds a status error, preferring the `detail` field of a JSON body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| match v.get("detail")? {
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| body.trim().to_string());
        ApiError::Status { status, message }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("name is required")]
    MissingName,
    #[error("phone is required")]
    MissingPhone,
    #[error("consent to data processing is required")]
    MissingConsent,
    #[error("failed to submit lead: {0}")]
    Submit(#[from] ApiError),
}
