//! Admin notice HTML.
//!
//! # Responsibility
//! - Render the standard notice element from resolved view values.
//! - Provide the footer script that posts persistent dismissals back.
//!
//! # Invariants
//! - Attribute values are always escaped; the message is emitted as given.

use crate::model::fields::NoticeType;
use std::collections::BTreeMap;

/// View values for one rendered notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeMarkupArgs {
    pub id: String,
    pub kind: NoticeType,
    pub message: String,
    pub dismissible: bool,
    pub paragraph_wrap: bool,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Renders `<div class="notice ...">` for one notice.
pub fn admin_notice_html(args: &NoticeMarkupArgs) -> String {
    let mut classes = vec![
        "notice".to_string(),
        format!("notice-{}", args.kind.as_str()),
    ];
    if args.dismissible {
        classes.push("is-dismissible".to_string());
    }
    classes.extend(args.classes.iter().filter(|c| !c.is_empty()).cloned());

    let mut html = String::from("<div");
    if !args.id.is_empty() {
        push_attribute(&mut html, "id", &args.id);
    }
    push_attribute(&mut html, "class", &classes.join(" "));
    for (name, value) in &args.attributes {
        if name == "id" || name == "class" {
            continue;
        }
        push_attribute(&mut html, name, value);
    }
    html.push('>');

    if args.paragraph_wrap {
        html.push_str("<p>");
        html.push_str(&args.message);
        html.push_str("</p>");
    } else {
        html.push_str(&args.message);
    }
    html.push_str("</div>");
    html
}

/// Footer script posting dismissals of persistent notices to `action`.
pub fn dismiss_script(action: &str, nonce_field: &str) -> String {
    format!(
        r#"<script type="text/javascript">
    (function($) {{
        $('.xwp-anm-notice.is-dismissible.is-persistent').on('click', '.notice-dismiss', function() {{
            var $notice = $(this).closest('.xwp-anm-notice');

            $.post(window.ajaxurl, {{
                action: '{action}',
                id: $notice.data('id'),
                {nonce_field}: $notice.data('nonce')
            }});
        }});
    }})(jQuery);
</script>"#,
        action = escape_js(action),
        nonce_field = escape_js(nonce_field),
    )
}

fn push_attribute(html: &mut String, name: &str, value: &str) {
    html.push(' ');
    html.push_str(name);
    html.push_str("=\"");
    html.push_str(&escape_attr(value));
    html.push('"');
}

/// Escapes text for use inside a double-quoted HTML attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_js(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{admin_notice_html, dismiss_script, escape_attr, NoticeMarkupArgs};
    use crate::model::fields::NoticeType;
    use std::collections::BTreeMap;

    fn args() -> NoticeMarkupArgs {
        NoticeMarkupArgs {
            id: "x".to_string(),
            kind: NoticeType::Success,
            message: "hello".to_string(),
            dismissible: true,
            paragraph_wrap: true,
            classes: vec!["xwp-anm-notice".to_string()],
            attributes: BTreeMap::from([
                ("data-id".to_string(), "x".to_string()),
                ("class".to_string(), "ignored".to_string()),
            ]),
        }
    }

    #[test]
    fn renders_wrapped_dismissible_notice() {
        assert_eq!(
            admin_notice_html(&args()),
            r#"<div id="x" class="notice notice-success is-dismissible xwp-anm-notice" data-id="x"><p>hello</p></div>"#
        );
    }

    #[test]
    fn skips_paragraph_when_unwrapped() {
        let mut args = args();
        args.paragraph_wrap = false;
        args.dismissible = false;
        args.message = "<h2>T</h2>".to_string();

        let html = admin_notice_html(&args);
        assert!(html.ends_with("><h2>T</h2></div>"));
        assert!(!html.contains("is-dismissible"));
    }

    #[test]
    fn escapes_attribute_values() {
        assert_eq!(escape_attr(r#"a"b<c>&'"#), "a&quot;b&lt;c&gt;&amp;&#039;");
    }

    #[test]
    fn script_targets_configured_action() {
        let script = dismiss_script("my_action", "_wpnonce");
        assert!(script.contains("action: 'my_action'"));
        assert!(script.contains("_wpnonce: $notice.data('nonce')"));
    }
}
