//! Admin notice entity.
//!
//! # Responsibility
//! - Expose typed accessors over the notice field schema.
//! - Track pending writes separately from committed values.
//! - Drive the notice lifecycle (load, save, dismiss, show, delete) through an
//!   explicitly passed repository.
//!
//! # Invariants
//! - Before the entity is marked read, setters write committed data directly.
//! - After it is marked read, a setter records a pending change when the value
//!   differs from committed data or a change for that field is already pending.
//! - A trashed notice never reaches the repository again.

use crate::model::fields::{
    NoticeChanges, NoticeData, NoticeField, NoticeType, RawNotice, UserId,
};
use crate::repo::notice_repo::{NoticeRepository, RepoResult};
use crate::store::OptionStore;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("valid hex color regex")
});

const SHOW_SUFFIX_LEN: usize = 13;

/// Shape selector for [`Notice::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataContext {
    /// Only fields that differ from the schema default, plus `id`.
    Save,
    /// Every field, plus `id`.
    Full,
}

/// One admin notice with dirty-tracked fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    id: String,
    trashed: bool,
    exists: bool,
    object_read: bool,
    data: NoticeData,
    changes: NoticeChanges,
}

impl Default for Notice {
    fn default() -> Self {
        Self::new()
    }
}

impl Notice {
    /// Creates an empty, unsaved notice. It is already considered read.
    pub fn new() -> Self {
        Self {
            id: String::new(),
            trashed: false,
            exists: false,
            object_read: true,
            data: NoticeData::default(),
            changes: NoticeChanges::default(),
        }
    }

    /// Loads a stored notice by id.
    ///
    /// # Errors
    /// - `RepoError::UnknownId` when the repository has no such notice.
    pub fn load<S: OptionStore>(id: &str, repo: &NoticeRepository<S>) -> RepoResult<Self> {
        let mut notice = Self {
            id: id.to_string(),
            exists: true,
            object_read: false,
            ..Self::new()
        };
        repo.read(&mut notice)?;
        Ok(notice)
    }

    /// Loads a fresh copy of the stored notice that `other` refers to.
    pub fn reload<S: OptionStore>(other: &Notice, repo: &NoticeRepository<S>) -> RepoResult<Self> {
        Self::load(other.id(), repo)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn is_read(&self) -> bool {
        self.object_read
    }

    pub fn set_object_read(&mut self, read: bool) -> &mut Self {
        self.object_read = read;
        self
    }

    /// Whether the notice is backed by a repository record.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed
    }

    /// Resets every field to its schema default and marks the notice unread.
    pub fn set_defaults(&mut self) -> &mut Self {
        self.data = NoticeData::default();
        self.changes = NoticeChanges::default();
        self.set_object_read(false)
    }

    /// Pending changes not yet merged into committed data.
    pub fn changes(&self) -> &NoticeChanges {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Merges pending changes into committed data and clears the changeset.
    pub fn apply_changes(&mut self) -> &mut Self {
        self.changes.merge_into(&mut self.data);
        self
    }

    /// Committed data as a raw field map.
    ///
    /// Pending changes are not included; callers that persist call
    /// [`Notice::apply_changes`] first.
    pub fn data(&self, context: DataContext) -> RawNotice {
        let defaults = NoticeData::default();
        let mut raw = Map::new();
        raw.insert("id".to_string(), Value::from(self.id.as_str()));

        for field in NoticeField::ALL {
            let value = self.data.value_of(field);
            if context == DataContext::Save && value == defaults.value_of(field) {
                continue;
            }
            raw.insert(field.as_str().to_string(), value);
        }

        raw
    }

    /// Current value of a field by stored name, pending changes included.
    ///
    /// Unknown names yield `None`.
    pub fn get_prop(&self, name: &str) -> Option<Value> {
        let field = NoticeField::parse(name)?;
        let mut effective = self.data.clone();
        self.changes.clone().merge_into(&mut effective);
        Some(effective.value_of(field))
    }

    /// Sets several properties from a raw field map.
    pub fn set_props(&mut self, props: &RawNotice) -> &mut Self {
        for (name, value) in props {
            self.set_prop(name, value);
        }
        self
    }

    /// Routes one raw property to its typed setter.
    ///
    /// Unknown names and values of the wrong JSON type are ignored.
    pub fn set_prop(&mut self, name: &str, value: &Value) -> &mut Self {
        if name == "id" {
            if let Some(id) = value.as_str() {
                self.set_id(id);
            }
            return self;
        }

        let Some(field) = NoticeField::parse(name) else {
            debug!("event=notice_prop_ignored module=model reason=unknown_field name={name}");
            return self;
        };

        let applied = match field {
            NoticeField::Type => value.as_str().map(|v| {
                self.set_type(v);
            }),
            NoticeField::Message => value.as_str().map(|v| {
                self.set_message(v);
            }),
            NoticeField::Title => value.as_str().map(|v| {
                self.set_title(v);
            }),
            NoticeField::TitleTag => value.as_str().map(|v| {
                self.set_title_tag(v);
            }),
            NoticeField::Template => value.as_str().map(|v| {
                self.set_template(v);
            }),
            NoticeField::Params => value.as_object().map(|v| {
                self.set_params(v.clone());
            }),
            NoticeField::Persistent => value.as_bool().map(|v| {
                self.set_persistent(v);
            }),
            NoticeField::Dismissible => value.as_bool().map(|v| {
                self.set_dismissible(v);
            }),
            NoticeField::Screens => list_from_value(value).map(|v| {
                self.set_screens(v);
            }),
            NoticeField::Caps => list_from_value(value).map(|v| {
                self.set_caps(v);
            }),
            NoticeField::Color => value.as_str().map(|v| {
                self.set_color(v);
            }),
            NoticeField::Individual => value.as_bool().map(|v| {
                self.set_individual(v);
            }),
            NoticeField::Attributes => value.as_object().map(|v| {
                self.set_attributes(string_map_from_object(v));
            }),
            NoticeField::Classes => list_from_value(value).map(|v| {
                self.set_classes(v);
            }),
            NoticeField::Style => style_from_value(value).map(|v| {
                self.set_style(v);
            }),
            NoticeField::TextWrap => value.as_bool().map(|v| {
                self.set_text_wrap(v);
            }),
            NoticeField::Dismissed => value.as_array().map(|v| {
                self.set_dismissed(v.iter().filter_map(Value::as_u64).collect());
            }),
        };

        if applied.is_none() {
            debug!(
                "event=notice_prop_ignored module=model reason=type_mismatch name={}",
                field.as_str()
            );
        }

        self
    }

    /// Sets the notice type from a keyword or a hex color.
    ///
    /// A hex color is stored as `color` and forces the `info` type; anything
    /// unrecognized falls back to `info`.
    pub fn set_type(&mut self, value: &str) -> &mut Self {
        if HEX_COLOR_RE.is_match(value) {
            self.set_color(value);
            return self.set_kind(NoticeType::Info);
        }

        self.set_kind(NoticeType::parse(value).unwrap_or_default())
    }

    pub fn kind(&self) -> NoticeType {
        self.changes.kind.unwrap_or(self.data.kind)
    }

    pub fn set_kind(&mut self, kind: NoticeType) -> &mut Self {
        stage(self.object_read, &mut self.data.kind, &mut self.changes.kind, kind);
        self
    }

    pub fn message(&self) -> &str {
        self.changes.message.as_deref().unwrap_or(&self.data.message)
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.message, &mut self.changes.message, message.into());
        self
    }

    pub fn title(&self) -> &str {
        self.changes.title.as_deref().unwrap_or(&self.data.title)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.title, &mut self.changes.title, title.into());
        self
    }

    pub fn title_tag(&self) -> &str {
        self.changes
            .title_tag
            .as_deref()
            .unwrap_or(&self.data.title_tag)
    }

    pub fn set_title_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.title_tag, &mut self.changes.title_tag, tag.into());
        self
    }

    pub fn template(&self) -> &str {
        self.changes.template.as_deref().unwrap_or(&self.data.template)
    }

    pub fn set_template(&mut self, path: impl Into<String>) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.template, &mut self.changes.template, path.into());
        self
    }

    pub fn params(&self) -> &Map<String, Value> {
        self.changes.params.as_ref().unwrap_or(&self.data.params)
    }

    pub fn set_params(&mut self, params: Map<String, Value>) -> &mut Self {
        stage(self.object_read, &mut self.data.params, &mut self.changes.params, params);
        self
    }

    pub fn persistent(&self) -> bool {
        self.changes.persistent.unwrap_or(self.data.persistent)
    }

    pub fn set_persistent(&mut self, persistent: bool) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.persistent, &mut self.changes.persistent, persistent);
        self
    }

    pub fn dismissible(&self) -> bool {
        self.changes.dismissible.unwrap_or(self.data.dismissible)
    }

    pub fn set_dismissible(&mut self, dismissible: bool) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.dismissible, &mut self.changes.dismissible, dismissible);
        self
    }

    pub fn screens(&self) -> &[String] {
        self.changes.screens.as_deref().unwrap_or(&self.data.screens)
    }

    /// Limits the notice to the given screen ids.
    pub fn set_screens<I, T>(&mut self, screens: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let screens = ordered_set(screens);
        stage(self.object_read, &mut self.data.screens, &mut self.changes.screens, screens);
        self
    }

    pub fn caps(&self) -> &[String] {
        self.changes.caps.as_deref().unwrap_or(&self.data.caps)
    }

    /// Sets the capabilities of which a viewer needs at least one.
    pub fn set_caps<I, T>(&mut self, caps: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let caps = ordered_set(caps);
        stage(self.object_read, &mut self.data.caps, &mut self.changes.caps, caps);
        self
    }

    pub fn color(&self) -> &str {
        self.changes.color.as_deref().unwrap_or(&self.data.color)
    }

    pub fn set_color(&mut self, color: impl Into<String>) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.color, &mut self.changes.color, color.into());
        self
    }

    pub fn individual(&self) -> bool {
        self.changes.individual.unwrap_or(self.data.individual)
    }

    pub fn set_individual(&mut self, individual: bool) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.individual, &mut self.changes.individual, individual);
        self
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        self.changes
            .attributes
            .as_ref()
            .unwrap_or(&self.data.attributes)
    }

    pub fn set_attributes(&mut self, attributes: BTreeMap<String, String>) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.attributes, &mut self.changes.attributes, attributes);
        self
    }

    /// Inserts or replaces one HTML attribute.
    pub fn with_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let mut attributes = self.attributes().clone();
        attributes.insert(name.into(), value.into());
        self.set_attributes(attributes)
    }

    pub fn classes(&self) -> &[String] {
        self.changes.classes.as_deref().unwrap_or(&self.data.classes)
    }

    pub fn set_classes<I, T>(&mut self, classes: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let classes = ordered_set(classes);
        stage(self.object_read, &mut self.data.classes, &mut self.changes.classes, classes);
        self
    }

    /// Appends classes after the current ones.
    pub fn with_classes<I, T>(&mut self, classes: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut merged = self.classes().to_vec();
        merged.extend(classes.into_iter().map(Into::into));
        self.set_classes(merged)
    }

    /// Whether the notice uses the alternative (tinted) display.
    pub fn is_alt(&self) -> bool {
        self.classes()
            .iter()
            .any(|class| class == "alt" || class == "notice-alt")
    }

    pub fn style(&self) -> &str {
        self.changes.style.as_deref().unwrap_or(&self.data.style)
    }

    pub fn set_style(&mut self, style: impl Into<String>) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.style, &mut self.changes.style, style.into());
        self
    }

    pub fn text_wrap(&self) -> bool {
        self.changes.text_wrap.unwrap_or(self.data.text_wrap)
    }

    pub fn set_text_wrap(&mut self, text_wrap: bool) -> &mut Self {
        let read = self.object_read;
        stage(read, &mut self.data.text_wrap, &mut self.changes.text_wrap, text_wrap);
        self
    }

    pub fn dismissed(&self) -> &[UserId] {
        self.changes
            .dismissed
            .as_deref()
            .unwrap_or(&self.data.dismissed)
    }

    pub fn set_dismissed(&mut self, users: Vec<UserId>) -> &mut Self {
        let mut unique = Vec::with_capacity(users.len());
        for user in users {
            if !unique.contains(&user) {
                unique.push(user);
            }
        }
        stage(self.object_read, &mut self.data.dismissed, &mut self.changes.dismissed, unique);
        self
    }

    /// Whether `user_id` has dismissed this notice.
    ///
    /// Shared notices record dismissal under user id `0`.
    pub fn is_dismissed(&self, user_id: UserId) -> bool {
        let user_id = if self.individual() { user_id } else { 0 };
        self.dismissed().contains(&user_id)
    }

    /// Dismisses the notice for `user_id`.
    ///
    /// Deletes the notice unless it is both dismissible and individual, in
    /// which case the user is recorded in `dismissed`.
    pub fn dismiss<S: OptionStore>(
        &mut self,
        repo: &mut NoticeRepository<S>,
        user_id: UserId,
    ) -> RepoResult<&mut Self> {
        if !self.dismissible() || !self.individual() {
            self.delete(repo, false)?;
            return Ok(self);
        }

        let mut users = self.dismissed().to_vec();
        users.push(user_id);
        Ok(self.set_dismissed(users))
    }

    /// Writes the notice to the repository and persists when `now` is set.
    ///
    /// Trashed notices are left untouched.
    pub fn save<S: OptionStore>(
        &mut self,
        repo: &mut NoticeRepository<S>,
        now: bool,
    ) -> RepoResult<&mut Self> {
        if self.trashed {
            return Ok(self);
        }

        if self.exists {
            repo.update(self)?;
        } else {
            repo.create(self)?;
            self.exists = true;
        }

        repo.persist(now)?;
        Ok(self)
    }

    /// Re-displays the notice under a fresh id as a one-shot notice.
    pub fn show<S: OptionStore>(&mut self, repo: &mut NoticeRepository<S>) -> RepoResult<&mut Self> {
        let source_id = self.id.clone();
        let suffix = Uuid::new_v4().simple().to_string();

        self.with_attribute("data-id", source_id.as_str())
            .set_id(format!("{source_id}-{}", &suffix[..SHOW_SUFFIX_LEN]))
            .set_persistent(false)
            .set_individual(false);
        self.exists = false;

        self.save(repo, false)
    }

    /// Removes the notice from the repository.
    ///
    /// Returns `false` when the notice is already trashed or was never stored.
    pub fn delete<S: OptionStore>(
        &mut self,
        repo: &mut NoticeRepository<S>,
        now: bool,
    ) -> RepoResult<bool> {
        if self.trashed || !self.exists {
            return Ok(false);
        }

        self.trashed = true;
        self.exists = false;
        repo.delete(self, now)
    }
}

/// Routes a write to committed data or to the pending changeset.
fn stage<T: PartialEq>(read: bool, committed: &mut T, pending: &mut Option<T>, value: T) {
    if read && (pending.is_some() || *committed != value) {
        *pending = Some(value);
    } else {
        *committed = value;
    }
}

/// Deduplicates while keeping first-seen order.
fn ordered_set<I, T>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.into();
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Splits a comma separated list, dropping blank items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn list_from_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(text) => Some(split_list(text)),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

fn string_map_from_object(object: &Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// Accepts free CSS text or a property map.
fn style_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(rules) => Some(
            string_map_from_object(rules)
                .iter()
                .map(|(property, rule)| format!("{property}: {rule}; "))
                .collect(),
        ),
        _ => None,
    }
}
