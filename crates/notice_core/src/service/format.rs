//! View-only formatting pipeline.
//!
//! # Responsibility
//! - Keep one filter chain per formatted field.
//! - Resolve view values (title markup, composed message, wrap policy, classes,
//!   inline style, attributes) without touching stored data.
//!
//! # Invariants
//! - Filters receive the stored value first and may only return a new value.
//! - Resolving a view never mutates the notice.

use crate::config::NoticeConfig;
use crate::hooks::{HookList, DEFAULT_PRIORITY};
use crate::host::AdminHost;
use crate::model::notice::Notice;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static HEADING_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^h[1-6]$").expect("valid heading tag regex"));

/// Marker class carried by every managed notice.
pub const NOTICE_CLASS: &str = "xwp-anm-notice";

pub type TextFilter = dyn Fn(String, &NoticeView<'_>) -> String;
pub type FlagFilter = dyn Fn(bool, &NoticeView<'_>) -> bool;
pub type ListFilter = dyn Fn(Vec<String>, &NoticeView<'_>) -> Vec<String>;
pub type AttributeFilter =
    dyn Fn(BTreeMap<String, String>, &NoticeView<'_>) -> BTreeMap<String, String>;

/// Filter chains applied when a notice field is read for display.
#[derive(Debug, Default)]
pub struct FormatHooks {
    pub title: HookList<TextFilter>,
    pub message: HookList<TextFilter>,
    pub text_wrap: HookList<FlagFilter>,
    pub classes: HookList<ListFilter>,
    pub style: HookList<TextFilter>,
    pub attributes: HookList<AttributeFilter>,
}

impl FormatHooks {
    /// Chains preloaded with the built-in formatters.
    pub fn with_defaults(config: &NoticeConfig) -> Self {
        let mut hooks = Self::default();
        let factor = config.lighten_factor;
        let action = config.dismiss_action.clone();

        hooks.title.add(DEFAULT_PRIORITY, Box::new(format_title));
        hooks.message.add(DEFAULT_PRIORITY - 1, Box::new(format_message));
        hooks.message.add(DEFAULT_PRIORITY, Box::new(format_template));
        hooks.text_wrap.add(DEFAULT_PRIORITY, Box::new(format_text_wrap));
        hooks.classes.add(DEFAULT_PRIORITY, Box::new(format_classes));
        hooks.style.add(
            DEFAULT_PRIORITY,
            Box::new(move |style: String, view: &NoticeView<'_>| {
                format_style(style, view, factor)
            }),
        );
        hooks.attributes.add(
            DEFAULT_PRIORITY,
            Box::new(move |atts: BTreeMap<String, String>, view: &NoticeView<'_>| {
                format_attributes(atts, view, &action)
            }),
        );

        hooks
    }
}

/// Display-time accessor for one notice.
pub struct NoticeView<'a> {
    notice: &'a Notice,
    host: &'a dyn AdminHost,
    hooks: &'a FormatHooks,
}

impl<'a> NoticeView<'a> {
    pub fn new(notice: &'a Notice, host: &'a dyn AdminHost, hooks: &'a FormatHooks) -> Self {
        Self {
            notice,
            host,
            hooks,
        }
    }

    pub fn notice(&self) -> &'a Notice {
        self.notice
    }

    pub fn host(&self) -> &'a dyn AdminHost {
        self.host
    }

    pub fn title(&self) -> String {
        apply_text(&self.hooks.title, self.notice.title().to_string(), self)
    }

    pub fn message(&self) -> String {
        apply_text(&self.hooks.message, self.notice.message().to_string(), self)
    }

    pub fn text_wrap(&self) -> bool {
        self.hooks
            .text_wrap
            .iter()
            .fold(self.notice.text_wrap(), |wrap, filter| filter(wrap, self))
    }

    pub fn classes(&self) -> Vec<String> {
        self.hooks
            .classes
            .iter()
            .fold(self.notice.classes().to_vec(), |classes, filter| {
                filter(classes, self)
            })
    }

    pub fn style(&self) -> String {
        apply_text(&self.hooks.style, self.notice.style().to_string(), self)
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.hooks
            .attributes
            .iter()
            .fold(self.notice.attributes().clone(), |atts, filter| {
                filter(atts, self)
            })
    }
}

fn apply_text(chain: &HookList<TextFilter>, value: String, view: &NoticeView<'_>) -> String {
    chain.iter().fold(value, |text, filter| filter(text, view))
}

/// Wraps a set title in its title tag.
pub fn format_title(title: String, view: &NoticeView<'_>) -> String {
    let notice = view.notice();
    if notice.title().is_empty() {
        return title;
    }

    let tag = match notice.title_tag() {
        "" => "span",
        tag => tag,
    };
    format!(r#"<{tag} class="notice-title">{}</{tag}>"#, notice.title())
}

/// Prefixes the formatted title to a non-empty message.
pub fn format_message(message: String, view: &NoticeView<'_>) -> String {
    if message.is_empty() || view.notice().title().is_empty() {
        return message;
    }

    view.host().kses_post(&format!("{}{message}", view.title()))
}

/// Falls back to the rendered template when no message is set.
pub fn format_template(message: String, view: &NoticeView<'_>) -> String {
    let notice = view.notice();
    if !message.is_empty() || notice.template().is_empty() {
        return message;
    }

    view.host()
        .render_template(notice.template(), notice.params())
        .unwrap_or(message)
}

/// Templates and heading titles bring their own block markup.
pub fn format_text_wrap(wrap: bool, view: &NoticeView<'_>) -> bool {
    let notice = view.notice();
    if !notice.template().is_empty() {
        return false;
    }
    if notice.title().is_empty() {
        return wrap;
    }

    !HEADING_TAG_RE.is_match(notice.title_tag())
}

/// Adds the marker classes and normalizes `alt`/`large` shorthands.
pub fn format_classes(mut classes: Vec<String>, view: &NoticeView<'_>) -> Vec<String> {
    let notice = view.notice();
    classes.push(NOTICE_CLASS.to_string());

    if notice.dismissible() && notice.persistent() {
        classes.push("is-persistent".to_string());
    }

    for short in ["alt", "large"] {
        let long = format!("notice-{short}");
        if !classes.iter().any(|c| c == short || *c == long) {
            continue;
        }
        classes.retain(|c| c != short && *c != long);
        classes.push(long);
    }

    classes
}

/// Adds the border color and, for alternative notices, a tinted background.
pub fn format_style(mut style: String, view: &NoticeView<'_>, factor: f64) -> String {
    let notice = view.notice();
    let color = notice.color();
    if color.is_empty() {
        return style;
    }

    style.push_str(&format!("border-left-color: {color} !important; "));
    if notice.is_alt() {
        style.push_str(&format!(
            "background-color: {} !important; ",
            lighten_color(color, factor)
        ));
    }

    style
}

/// Adds style, id and dismissal nonce attributes, dropping empty values.
pub fn format_attributes(
    mut atts: BTreeMap<String, String>,
    view: &NoticeView<'_>,
    dismiss_action: &str,
) -> BTreeMap<String, String> {
    let notice = view.notice();
    atts.insert("style".to_string(), view.style());
    atts.entry("data-id".to_string())
        .or_insert_with(|| notice.id().to_string());

    if notice.dismissible() {
        atts.insert(
            "data-nonce".to_string(),
            view.host().create_nonce(dismiss_action),
        );
    }

    atts.retain(|_, value| !value.is_empty());
    atts
}

/// Mixes `factor` of white into each channel of a hex color.
///
/// Three-digit colors are expanded first; unparsable channels count as 0.
pub fn lighten_color(color: &str, factor: f64) -> String {
    let hex = color.trim_start_matches('#');
    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };

    let channel = |start: usize| -> u8 {
        let parsed = expanded
            .get(start..start + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0);
        let mixed = f64::from(parsed) * (1.0 - factor) + 255.0 * factor;
        mixed.clamp(0.0, 255.0) as u8
    };

    format!("#{:02x}{:02x}{:02x}", channel(0), channel(2), channel(4))
}
