//! Host environment contract.
//!
//! # Responsibility
//! - Describe what the notice manager needs from the admin panel it runs in:
//!   identity, capabilities, current screen, nonces, templates, sanitizing.
//! - Provide a self-contained host for command line use and tests.
//!
//! # Invariants
//! - Host calls never mutate notices; they only answer questions.

use crate::model::fields::UserId;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

static TEMPLATE_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid template var regex")
});
static UNSAFE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|iframe)\b[^>]*>.*?</(script|style|iframe)\s*>")
        .expect("valid unsafe block regex")
});
static EVENT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid event attr regex")
});

const NONCE_LEN: usize = 10;

/// Services the admin panel provides to the notice manager.
pub trait AdminHost {
    fn current_user_id(&self) -> UserId;

    fn current_user_can(&self, capability: &str) -> bool;

    /// Id of the admin screen being rendered, if any.
    fn current_screen_id(&self) -> Option<String>;

    /// Whether the request renders an admin page.
    fn is_admin(&self) -> bool {
        true
    }

    /// Whether the request is an AJAX call.
    fn doing_ajax(&self) -> bool {
        false
    }

    fn create_nonce(&self, action: &str) -> String;

    fn verify_nonce(&self, action: &str, nonce: &str) -> bool;

    /// Renders a template file with parameters. `None` when it cannot be found.
    fn render_template(&self, path: &str, params: &Map<String, Value>) -> Option<String>;

    /// Sanitizes HTML allowed in post content.
    fn kses_post(&self, html: &str) -> String;
}

/// Host backed by fixed identity values and template files on disk.
#[derive(Debug, Clone)]
pub struct StandaloneHost {
    user_id: UserId,
    capabilities: BTreeSet<String>,
    screen_id: Option<String>,
    admin: bool,
    ajax: bool,
    nonce_salt: String,
    template_root: Option<PathBuf>,
}

impl StandaloneHost {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            capabilities: BTreeSet::new(),
            screen_id: None,
            admin: true,
            ajax: false,
            nonce_salt: "notice-manager".to_string(),
            template_root: None,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_screen(mut self, screen_id: impl Into<String>) -> Self {
        self.screen_id = Some(screen_id.into());
        self
    }

    /// Marks the host as serving an AJAX request instead of an admin page.
    pub fn for_ajax(mut self) -> Self {
        self.admin = false;
        self.ajax = true;
        self
    }

    pub fn with_nonce_salt(mut self, salt: impl Into<String>) -> Self {
        self.nonce_salt = salt.into();
        self
    }

    /// Resolves relative template paths against `root`.
    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.template_root = Some(root.into());
        self
    }

    fn template_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        match &self.template_root {
            Some(root) if candidate.is_relative() => root.join(candidate),
            _ => candidate.to_path_buf(),
        }
    }
}

impl AdminHost for StandaloneHost {
    fn current_user_id(&self) -> UserId {
        self.user_id
    }

    fn current_user_can(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    fn current_screen_id(&self) -> Option<String> {
        self.screen_id.clone()
    }

    fn is_admin(&self) -> bool {
        self.admin
    }

    fn doing_ajax(&self) -> bool {
        self.ajax
    }

    fn create_nonce(&self, action: &str) -> String {
        let digest = Sha256::digest(format!("{}|{action}|{}", self.nonce_salt, self.user_id));
        let mut nonce = hex::encode(digest);
        nonce.truncate(NONCE_LEN);
        nonce
    }

    fn verify_nonce(&self, action: &str, nonce: &str) -> bool {
        !nonce.is_empty() && self.create_nonce(action) == nonce
    }

    fn render_template(&self, path: &str, params: &Map<String, Value>) -> Option<String> {
        let resolved = self.template_path(path);
        let source = match std::fs::read_to_string(&resolved) {
            Ok(source) => source,
            Err(err) => {
                debug!(
                    "event=template_render module=host status=skip path={} error={err}",
                    resolved.display()
                );
                return None;
            }
        };

        let rendered = TEMPLATE_VAR_RE.replace_all(&source, |caps: &Captures<'_>| {
            match params.get(&caps[1]) {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        });
        Some(rendered.into_owned())
    }

    fn kses_post(&self, html: &str) -> String {
        let without_blocks = UNSAFE_BLOCK_RE.replace_all(html, "");
        EVENT_ATTR_RE.replace_all(&without_blocks, "").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{AdminHost, StandaloneHost};
    use serde_json::{json, Map, Value};

    #[test]
    fn nonce_is_bound_to_action_and_user() {
        let host = StandaloneHost::new(5);
        let nonce = host.create_nonce("dismiss");

        assert_eq!(nonce.len(), 10);
        assert!(host.verify_nonce("dismiss", &nonce));
        assert!(!host.verify_nonce("other", &nonce));
        assert!(!StandaloneHost::new(6).verify_nonce("dismiss", &nonce));
        assert!(!host.verify_nonce("dismiss", ""));

        let salted = StandaloneHost::new(5).with_nonce_salt("other-site");
        assert!(!salted.verify_nonce("dismiss", &nonce));
    }

    #[test]
    fn renders_template_variables() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("hello.html"), "<p>Hi {{ name }}, {{count}} {{missing}}</p>")
            .expect("write template");
        let host = StandaloneHost::new(1).with_template_root(dir.path());

        let Value::Object(params) = json!({"name": "Ada", "count": 3}) else {
            unreachable!("literal is an object");
        };
        assert_eq!(
            host.render_template("hello.html", &params).as_deref(),
            Some("<p>Hi Ada, 3 </p>")
        );
        assert_eq!(host.render_template("absent.html", &Map::new()), None);
    }

    #[test]
    fn kses_strips_scripts_and_handlers() {
        let host = StandaloneHost::new(1);
        let clean = host.kses_post(r#"<b onclick="x()">ok</b><script>alert(1)</script>"#);
        assert_eq!(clean, "<b>ok</b>");
    }

    #[test]
    fn capability_and_screen_lookup() {
        let host = StandaloneHost::new(1)
            .with_capability("manage_options")
            .with_screen("dashboard");
        assert!(host.current_user_can("manage_options"));
        assert!(!host.current_user_can("edit_posts"));
        assert_eq!(host.current_screen_id().as_deref(), Some("dashboard"));
        assert!(host.is_admin());
        assert!(StandaloneHost::new(1).for_ajax().doing_ajax());
    }
}
