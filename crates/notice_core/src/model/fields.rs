//! Notice field schema.
//!
//! # Responsibility
//! - Name every stored notice field and its schema default.
//! - Hold committed values (`NoticeData`) and pending writes (`NoticeChanges`)
//!   in two separate, statically typed shapes.
//!
//! # Invariants
//! - `NoticeData::default()` is the schema default used by save-context diffs.
//! - A `None` slot in `NoticeChanges` means "no pending write" for that field.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Raw field map as persisted in the option record.
pub type RawNotice = Map<String, Value>;

/// Identifier of a host user.
pub type UserId = u64;

/// Capability required to see a notice unless the caller overrides `caps`.
pub const DEFAULT_CAPABILITY: &str = "manage_options";

/// Title tag used when none is configured.
pub const DEFAULT_TITLE_TAG: &str = "span";

/// Visual category of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeType {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl NoticeType {
    /// Stable keyword used in storage and CSS class names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Parses a recognized keyword; anything else yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

/// Stored notice fields, named the way they appear in the option record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoticeField {
    Type,
    Message,
    Title,
    TitleTag,
    Template,
    Params,
    Persistent,
    Dismissible,
    Screens,
    Caps,
    Color,
    Individual,
    Attributes,
    Classes,
    Style,
    TextWrap,
    Dismissed,
}

impl NoticeField {
    /// Every field in persisted order.
    pub const ALL: [NoticeField; 17] = [
        Self::Type,
        Self::Message,
        Self::Title,
        Self::TitleTag,
        Self::Template,
        Self::Params,
        Self::Persistent,
        Self::Dismissible,
        Self::Screens,
        Self::Caps,
        Self::Color,
        Self::Individual,
        Self::Attributes,
        Self::Classes,
        Self::Style,
        Self::TextWrap,
        Self::Dismissed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Message => "message",
            Self::Title => "title",
            Self::TitleTag => "title_tag",
            Self::Template => "template",
            Self::Params => "params",
            Self::Persistent => "persistent",
            Self::Dismissible => "dismissible",
            Self::Screens => "screens",
            Self::Caps => "caps",
            Self::Color => "color",
            Self::Individual => "individual",
            Self::Attributes => "attributes",
            Self::Classes => "classes",
            Self::Style => "style",
            Self::TextWrap => "text_wrap",
            Self::Dismissed => "dismissed",
        }
    }

    /// Resolves a stored property name. `cap` is accepted as an alias of `caps`.
    pub fn parse(name: &str) -> Option<Self> {
        if name == "cap" {
            return Some(Self::Caps);
        }
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

/// Committed notice values.
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeData {
    /// Stored under the `type` key.
    pub kind: NoticeType,
    pub message: String,
    pub title: String,
    pub title_tag: String,
    /// Template path, rendered by the host when `message` is empty.
    pub template: String,
    pub params: Map<String, Value>,
    pub persistent: bool,
    pub dismissible: bool,
    /// Screen ids the notice is limited to. Empty means every screen.
    pub screens: Vec<String>,
    /// Capabilities of which the viewer needs at least one. Empty means anyone.
    pub caps: Vec<String>,
    pub color: String,
    /// Tracks dismissal per user instead of deleting the notice.
    pub individual: bool,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
    pub style: String,
    pub text_wrap: bool,
    pub dismissed: Vec<UserId>,
}

impl Default for NoticeData {
    fn default() -> Self {
        Self {
            kind: NoticeType::Info,
            message: String::new(),
            title: String::new(),
            title_tag: DEFAULT_TITLE_TAG.to_string(),
            template: String::new(),
            params: Map::new(),
            persistent: false,
            dismissible: true,
            screens: Vec::new(),
            caps: vec![DEFAULT_CAPABILITY.to_string()],
            color: String::new(),
            individual: false,
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            style: String::new(),
            text_wrap: true,
            dismissed: Vec::new(),
        }
    }
}

impl NoticeData {
    /// JSON value of one field, as it is written to storage.
    pub fn value_of(&self, field: NoticeField) -> Value {
        match field {
            NoticeField::Type => Value::from(self.kind.as_str()),
            NoticeField::Message => Value::from(self.message.as_str()),
            NoticeField::Title => Value::from(self.title.as_str()),
            NoticeField::TitleTag => Value::from(self.title_tag.as_str()),
            NoticeField::Template => Value::from(self.template.as_str()),
            NoticeField::Params => Value::Object(self.params.clone()),
            NoticeField::Persistent => Value::from(self.persistent),
            NoticeField::Dismissible => Value::from(self.dismissible),
            NoticeField::Screens => Value::from(self.screens.clone()),
            NoticeField::Caps => Value::from(self.caps.clone()),
            NoticeField::Color => Value::from(self.color.as_str()),
            NoticeField::Individual => Value::from(self.individual),
            NoticeField::Attributes => string_map_value(&self.attributes),
            NoticeField::Classes => Value::from(self.classes.clone()),
            NoticeField::Style => Value::from(self.style.as_str()),
            NoticeField::TextWrap => Value::from(self.text_wrap),
            NoticeField::Dismissed => Value::from(self.dismissed.clone()),
        }
    }
}

/// Pending writes made after a notice finished loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoticeChanges {
    pub kind: Option<NoticeType>,
    pub message: Option<String>,
    pub title: Option<String>,
    pub title_tag: Option<String>,
    pub template: Option<String>,
    pub params: Option<Map<String, Value>>,
    pub persistent: Option<bool>,
    pub dismissible: Option<bool>,
    pub screens: Option<Vec<String>>,
    pub caps: Option<Vec<String>>,
    pub color: Option<String>,
    pub individual: Option<bool>,
    pub attributes: Option<BTreeMap<String, String>>,
    pub classes: Option<Vec<String>>,
    pub style: Option<String>,
    pub text_wrap: Option<bool>,
    pub dismissed: Option<Vec<UserId>>,
}

impl NoticeChanges {
    /// Whether a write is pending for `field`.
    pub fn contains(&self, field: NoticeField) -> bool {
        match field {
            NoticeField::Type => self.kind.is_some(),
            NoticeField::Message => self.message.is_some(),
            NoticeField::Title => self.title.is_some(),
            NoticeField::TitleTag => self.title_tag.is_some(),
            NoticeField::Template => self.template.is_some(),
            NoticeField::Params => self.params.is_some(),
            NoticeField::Persistent => self.persistent.is_some(),
            NoticeField::Dismissible => self.dismissible.is_some(),
            NoticeField::Screens => self.screens.is_some(),
            NoticeField::Caps => self.caps.is_some(),
            NoticeField::Color => self.color.is_some(),
            NoticeField::Individual => self.individual.is_some(),
            NoticeField::Attributes => self.attributes.is_some(),
            NoticeField::Classes => self.classes.is_some(),
            NoticeField::Style => self.style.is_some(),
            NoticeField::TextWrap => self.text_wrap.is_some(),
            NoticeField::Dismissed => self.dismissed.is_some(),
        }
    }

    /// Fields with a pending write, in schema order.
    pub fn fields(&self) -> Vec<NoticeField> {
        NoticeField::ALL
            .into_iter()
            .filter(|field| self.contains(*field))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Moves every pending value into `data`, leaving `self` empty.
    pub fn merge_into(&mut self, data: &mut NoticeData) {
        let changes = std::mem::take(self);

        if let Some(value) = changes.kind {
            data.kind = value;
        }
        if let Some(value) = changes.message {
            data.message = value;
        }
        if let Some(value) = changes.title {
            data.title = value;
        }
        if let Some(value) = changes.title_tag {
            data.title_tag = value;
        }
        if let Some(value) = changes.template {
            data.template = value;
        }
        if let Some(value) = changes.params {
            data.params = value;
        }
        if let Some(value) = changes.persistent {
            data.persistent = value;
        }
        if let Some(value) = changes.dismissible {
            data.dismissible = value;
        }
        if let Some(value) = changes.screens {
            data.screens = value;
        }
        if let Some(value) = changes.caps {
            data.caps = value;
        }
        if let Some(value) = changes.color {
            data.color = value;
        }
        if let Some(value) = changes.individual {
            data.individual = value;
        }
        if let Some(value) = changes.attributes {
            data.attributes = value;
        }
        if let Some(value) = changes.classes {
            data.classes = value;
        }
        if let Some(value) = changes.style {
            data.style = value;
        }
        if let Some(value) = changes.text_wrap {
            data.text_wrap = value;
        }
        if let Some(value) = changes.dismissed {
            data.dismissed = value;
        }
    }
}

fn string_map_value(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
            .collect(),
    )
}
