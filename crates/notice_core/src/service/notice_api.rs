//! Functional entry points over a notice repository.
//!
//! # Responsibility
//! - Build notices from a struct of optional fields.
//! - Provide fetch/delete/clear shortcuts that degrade gracefully.

use crate::model::notice::{split_list, Notice};
use crate::repo::notice_repo::{NoticeRepository, RepoResult};
use crate::store::OptionStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A list given either as a comma separated string or as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    Joined(String),
    Items(Vec<String>),
}

impl ListInput {
    pub fn into_items(self) -> Vec<String> {
        match self {
            Self::Joined(text) => split_list(&text),
            Self::Items(items) => items,
        }
    }
}

/// Arguments for [`create_notice`]; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewNotice {
    pub id: Option<String>,
    /// Keyword or hex color, see [`Notice::set_type`].
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
    pub title: Option<String>,
    pub title_tag: Option<String>,
    pub template: Option<String>,
    pub params: Option<Map<String, Value>>,
    pub persistent: Option<bool>,
    pub dismissible: Option<bool>,
    pub screens: Option<ListInput>,
    #[serde(alias = "cap")]
    pub caps: Option<ListInput>,
    pub color: Option<String>,
    pub individual: Option<bool>,
    pub attributes: Option<BTreeMap<String, String>>,
    pub classes: Option<ListInput>,
    pub style: Option<String>,
    pub text_wrap: Option<bool>,
}

/// Builds an unsaved notice from optional arguments.
pub fn create_notice(args: NewNotice) -> Notice {
    let mut notice = Notice::new();

    if let Some(id) = args.id {
        notice.set_id(id);
    }
    if let Some(kind) = args.kind {
        notice.set_type(&kind);
    }
    if let Some(message) = args.message {
        notice.set_message(message);
    }
    if let Some(title) = args.title {
        notice.set_title(title);
    }
    if let Some(tag) = args.title_tag {
        notice.set_title_tag(tag);
    }
    if let Some(template) = args.template {
        notice.set_template(template);
    }
    if let Some(params) = args.params {
        notice.set_params(params);
    }
    if let Some(persistent) = args.persistent {
        notice.set_persistent(persistent);
    }
    if let Some(dismissible) = args.dismissible {
        notice.set_dismissible(dismissible);
    }
    if let Some(screens) = args.screens {
        notice.set_screens(screens.into_items());
    }
    if let Some(caps) = args.caps {
        notice.set_caps(caps.into_items());
    }
    if let Some(color) = args.color {
        notice.set_color(color);
    }
    if let Some(individual) = args.individual {
        notice.set_individual(individual);
    }
    if let Some(attributes) = args.attributes {
        notice.set_attributes(attributes);
    }
    if let Some(classes) = args.classes {
        notice.set_classes(classes.into_items());
    }
    if let Some(style) = args.style {
        notice.set_style(style);
    }
    if let Some(text_wrap) = args.text_wrap {
        notice.set_text_wrap(text_wrap);
    }

    notice
}

/// Fetches a stored notice.
///
/// When absent and `make` is set, returns a new unsaved notice with that id.
pub fn get_notice<S: OptionStore>(
    repo: &NoticeRepository<S>,
    id: &str,
    make: bool,
) -> Option<Notice> {
    match repo.get(id) {
        Some(notice) => Some(notice),
        None if make => {
            let mut notice = Notice::new();
            notice.set_id(id);
            Some(notice)
        }
        None => None,
    }
}

pub fn get_notices<S: OptionStore>(repo: &NoticeRepository<S>) -> Vec<Notice> {
    repo.all()
}

/// Deletes a stored notice by id. Returns `false` when it is absent.
pub fn delete_notice<S: OptionStore>(
    repo: &mut NoticeRepository<S>,
    id: &str,
    now: bool,
) -> RepoResult<bool> {
    match get_notice(repo, id, false) {
        Some(mut notice) => notice.delete(repo, now),
        None => Ok(false),
    }
}

pub fn clear_notices<S: OptionStore>(repo: &mut NoticeRepository<S>, force: bool) -> RepoResult<()> {
    repo.clear(force)
}

#[cfg(test)]
mod tests {
    use super::{create_notice, delete_notice, get_notice, NewNotice};
    use crate::model::fields::NoticeType;
    use crate::repo::notice_repo::NoticeRepository;
    use crate::store::MemoryOptionStore;

    #[test]
    fn builds_notice_from_json_args() {
        let args: NewNotice = serde_json::from_str(
            r##"{
                "id": "welcome",
                "type": "#ff0000",
                "message": "Hello",
                "screens": "dashboard,plugins",
                "cap": ["edit_posts", "edit_posts"],
                "classes": ["alt"]
            }"##,
        )
        .expect("valid args");

        let notice = create_notice(args);
        assert_eq!(notice.id(), "welcome");
        assert_eq!(notice.kind(), NoticeType::Info);
        assert_eq!(notice.color(), "#ff0000");
        assert_eq!(notice.screens(), ["dashboard", "plugins"]);
        assert_eq!(notice.caps(), ["edit_posts"]);
        assert!(notice.is_alt());
        assert!(!notice.exists());
    }

    #[test]
    fn get_notice_makes_unsaved_notice_on_request() {
        let repo = NoticeRepository::load(MemoryOptionStore::new(), "n").expect("repo");

        assert!(get_notice(&repo, "ghost", false).is_none());
        let made = get_notice(&repo, "ghost", true).expect("made notice");
        assert_eq!(made.id(), "ghost");
        assert!(!made.exists());
    }

    #[test]
    fn delete_of_absent_notice_returns_false() {
        let mut repo = NoticeRepository::load(MemoryOptionStore::new(), "n").expect("repo");
        assert!(!delete_notice(&mut repo, "ghost", true).expect("delete"));
        assert_eq!(repo.store().writes(), 0);
    }
}
