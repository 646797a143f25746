//! Notice display and dismissal service.
//!
//! # Responsibility
//! - Run the per-request display pass: fetch, filter, check visibility,
//!   render, and drop one-shot notices.
//! - Handle the dismissal AJAX request.
//! - Own the extension registries consulted along the way.
//!
//! # Invariants
//! - Non-persistent notices are deleted right after they are rendered.
//! - Display filters live for one display pass only.
//! - The dismissal script is only offered after a dismissible notice rendered.

use crate::config::NoticeConfig;
use crate::hooks::HookList;
use crate::host::AdminHost;
use crate::markup::{admin_notice_html, dismiss_script, NoticeMarkupArgs};
use crate::model::notice::Notice;
use crate::repo::notice_repo::{NoticeRepository, RepoError, RepoResult};
use crate::service::format::{FormatHooks, NoticeView};
use crate::service::notice_api::get_notice;
use crate::store::OptionStore;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rewrites the notice list before display.
pub type DisplayFilter = dyn Fn(Vec<Notice>) -> Vec<Notice>;
/// Overrides whether one notice may be displayed.
pub type VisibilityFilter = dyn Fn(bool, &Notice, &dyn AdminHost) -> bool;
/// Runs before or after the display pass.
pub type DisplayAction = dyn Fn(&dyn AdminHost);

/// Dismissal request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DismissRequest {
    pub id: String,
    pub nonce: String,
}

impl DismissRequest {
    /// Reads `id` and the configured nonce field from posted form fields.
    pub fn from_form(fields: &BTreeMap<String, String>, config: &NoticeConfig) -> Self {
        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            id: field("id"),
            nonce: field(&config.nonce_field),
        }
    }
}

/// One notice rendered by a display pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotice {
    pub id: String,
    pub html: String,
    pub args: NoticeMarkupArgs,
}

#[derive(Debug)]
pub enum ManagerError {
    /// The dismissal nonce did not verify.
    InvalidNonce,
    Repo(RepoError),
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNonce => write!(f, "dismissal nonce failed verification"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidNonce => None,
        }
    }
}

impl From<RepoError> for ManagerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Request-scoped notice manager.
pub struct NoticeManager<S: OptionStore> {
    repo: NoticeRepository<S>,
    config: NoticeConfig,
    format: FormatHooks,
    display_filters: HookList<DisplayFilter>,
    visibility: HookList<VisibilityFilter>,
    before_display: HookList<DisplayAction>,
    after_display: HookList<DisplayAction>,
    with_js: bool,
    displayed: bool,
}

impl<S: OptionStore> NoticeManager<S> {
    /// Creates a manager with the built-in formatters registered.
    pub fn new(repo: NoticeRepository<S>, config: NoticeConfig) -> Self {
        let format = FormatHooks::with_defaults(&config);
        Self {
            repo,
            config,
            format,
            display_filters: HookList::new(),
            visibility: HookList::new(),
            before_display: HookList::new(),
            after_display: HookList::new(),
            with_js: false,
            displayed: false,
        }
    }

    /// Loads the configured option record from `store` and wraps it.
    pub fn from_store(store: S, config: NoticeConfig) -> RepoResult<Self> {
        let repo = NoticeRepository::with_config(store, &config)?;
        Ok(Self::new(repo, config))
    }

    pub fn repo(&self) -> &NoticeRepository<S> {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut NoticeRepository<S> {
        &mut self.repo
    }

    pub fn config(&self) -> &NoticeConfig {
        &self.config
    }

    pub fn format_hooks(&self) -> &FormatHooks {
        &self.format
    }

    pub fn format_hooks_mut(&mut self) -> &mut FormatHooks {
        &mut self.format
    }

    /// Registers a filter over the notices of the next display pass.
    pub fn add_display_filter(&mut self, priority: i32, filter: Box<DisplayFilter>) {
        self.display_filters.add(priority, filter);
    }

    pub fn add_visibility_filter(&mut self, priority: i32, filter: Box<VisibilityFilter>) {
        self.visibility.add(priority, filter);
    }

    pub fn on_before_display(&mut self, priority: i32, action: Box<DisplayAction>) {
        self.before_display.add(priority, action);
    }

    pub fn on_after_display(&mut self, priority: i32, action: Box<DisplayAction>) {
        self.after_display.add(priority, action);
    }

    /// Whether a display pass already ran during this request.
    pub fn has_displayed(&self) -> bool {
        self.displayed
    }

    /// Whether a notice created now would still be rendered in this request.
    pub fn can_show(&self, host: &dyn AdminHost) -> bool {
        host.is_admin() && !host.doing_ajax() && !self.displayed
    }

    /// Resolves display-time values of `notice`.
    pub fn view<'a>(&'a self, notice: &'a Notice, host: &'a dyn AdminHost) -> NoticeView<'a> {
        NoticeView::new(notice, host, &self.format)
    }

    /// Runs the display pass for the current admin page.
    pub fn display_notices(&mut self, host: &dyn AdminHost) -> RepoResult<Vec<RenderedNotice>> {
        for action in self.before_display.iter() {
            action(host);
        }

        let notices = self
            .display_filters
            .iter()
            .fold(self.repo.all(), |notices, filter| filter(notices));

        let mut rendered = Vec::new();
        for mut notice in notices {
            if !self.can_display(&notice, host) {
                debug!(
                    "event=notice_display module=manager status=skip id={}",
                    notice.id()
                );
                continue;
            }

            let args = self.notice_args(&notice, host);
            if args.dismissible {
                self.with_js = true;
            }
            rendered.push(RenderedNotice {
                id: notice.id().to_string(),
                html: admin_notice_html(&args),
                args,
            });

            if notice.persistent() {
                continue;
            }
            notice.delete(&mut self.repo, false)?;
        }

        for action in self.after_display.iter() {
            action(host);
        }
        self.display_filters.clear();
        self.displayed = true;

        info!(
            "event=notice_display module=manager status=ok rendered={}",
            rendered.len()
        );
        Ok(rendered)
    }

    /// Footer script for dismissible notices, when one was rendered.
    pub fn footer_script(&self) -> Option<String> {
        self.with_js
            .then(|| dismiss_script(&self.config.dismiss_action, &self.config.nonce_field))
    }

    /// Visibility check: data, screen and capability, then the registered filters.
    pub fn can_display(&self, notice: &Notice, host: &dyn AdminHost) -> bool {
        let show = data_valid(notice, host) && screen_valid(notice, host) && cap_valid(notice, host);
        self.visibility
            .iter()
            .fold(show, |show, filter| filter(show, notice, host))
    }

    fn notice_args(&self, notice: &Notice, host: &dyn AdminHost) -> NoticeMarkupArgs {
        let view = self.view(notice, host);
        NoticeMarkupArgs {
            id: notice.id().to_string(),
            kind: notice.kind(),
            message: view.message(),
            dismissible: notice.dismissible(),
            paragraph_wrap: view.text_wrap(),
            classes: view.classes(),
            attributes: view.attributes(),
        }
    }

    /// Handles the dismissal AJAX request, then ends the request.
    ///
    /// Returns whether a notice with the requested id was found.
    ///
    /// # Errors
    /// - `ManagerError::InvalidNonce` when the nonce does not verify.
    pub fn dismiss_notice(
        &mut self,
        host: &dyn AdminHost,
        request: &DismissRequest,
    ) -> Result<bool, ManagerError> {
        if !host.verify_nonce(&self.config.dismiss_action, &request.nonce) {
            warn!(
                "event=notice_dismiss module=manager status=error error_code=invalid_nonce id={}",
                request.id
            );
            return Err(ManagerError::InvalidNonce);
        }

        let found = match get_notice(&self.repo, &request.id, false) {
            Some(mut notice) => {
                notice
                    .dismiss(&mut self.repo, host.current_user_id())?
                    .save(&mut self.repo, true)?;
                true
            }
            None => false,
        };

        info!(
            "event=notice_dismiss module=manager status=ok id={} found={found}",
            request.id
        );
        self.shutdown()?;
        Ok(found)
    }

    /// End-of-request flush.
    pub fn shutdown(&mut self) -> RepoResult<bool> {
        self.repo.shutdown()
    }

    /// Consumes the manager, returning its repository.
    pub fn into_repo(self) -> NoticeRepository<S> {
        self.repo
    }
}

fn data_valid(notice: &Notice, host: &dyn AdminHost) -> bool {
    (!notice.message().is_empty() || !notice.template().is_empty())
        && !notice.is_dismissed(host.current_user_id())
}

fn screen_valid(notice: &Notice, host: &dyn AdminHost) -> bool {
    if notice.screens().is_empty() {
        return true;
    }
    let screen = host.current_screen_id().unwrap_or_default();
    notice.screens().iter().any(|id| *id == screen)
}

fn cap_valid(notice: &Notice, host: &dyn AdminHost) -> bool {
    notice.caps().is_empty() || notice.caps().iter().any(|cap| host.current_user_can(cap))
}
