//! Editor session: a mutable ordered list of toast drafts bound to the
//! persistence API and a preview screen.

use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tracing::debug;

use crate::client::api::{ApiClientError, ToastApi};
use crate::client::screen::ToastScreen;
use crate::domain::toasts::{
    self, DEFAULT_DURATION_MS, Toast, ToastKind, ToastPosition,
};

/// Per-entry delay when previewing the whole draft list.
pub const PREVIEW_STAGGER: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Surface the session drives: a status banner and the save control.
pub trait EditorView: Send {
    fn show_status(&mut self, level: StatusLevel, message: &str);
    fn set_save_enabled(&mut self, enabled: bool);
}

/// One form row. `number` is the 1-based display number, kept current by the
/// session; `id` correlates the row across edits and is stored verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastDraft {
    pub id: String,
    pub number: usize,
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub position: ToastPosition,
    pub duration: i64,
    pub auto_hide: bool,
}

pub struct EditorSession<A, V> {
    api: A,
    view: V,
    screen: ToastScreen,
    drafts: Vec<ToastDraft>,
    counter: u64,
}

impl<A: ToastApi, V: EditorView> EditorSession<A, V> {
    pub fn new(api: A, view: V) -> Self {
        Self {
            api,
            view,
            screen: ToastScreen::new(),
            drafts: Vec::new(),
            counter: 0,
        }
    }

    pub fn drafts(&self) -> &[ToastDraft] {
        &self.drafts
    }

    /// Mutable access for form binding; display numbers are reconciled on the
    /// next add or remove.
    pub fn drafts_mut(&mut self) -> &mut [ToastDraft] {
        &mut self.drafts
    }

    pub fn screen(&self) -> &ToastScreen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut ToastScreen {
        &mut self.screen
    }

    /// Append one draft, from `template` or the defaults, and renumber.
    pub fn add_entry(&mut self, template: Option<&Toast>) {
        let id = self.next_id();
        let draft = match template {
            Some(toast) => ToastDraft {
                id,
                number: 0,
                title: toast.title.clone(),
                message: toast.message.clone(),
                kind: toast.kind,
                position: toast.position,
                duration: if toast.duration == 0 {
                    DEFAULT_DURATION_MS
                } else {
                    toast.duration
                },
                auto_hide: toast.auto_hide,
            },
            None => ToastDraft {
                id,
                number: 0,
                title: String::new(),
                message: String::new(),
                kind: ToastKind::Success,
                position: ToastPosition::TopRight,
                duration: DEFAULT_DURATION_MS,
                auto_hide: true,
            },
        };
        self.drafts.push(draft);
        self.renumber();
    }

    /// Remove the draft at `index`. The list never goes empty: removing the
    /// sole remaining entry is refused with a status message.
    pub fn remove_entry(&mut self, index: usize) -> bool {
        if self.drafts.len() <= 1 {
            self.view
                .show_status(StatusLevel::Error, "You need at least one toast item");
            return false;
        }
        if index >= self.drafts.len() {
            return false;
        }
        self.drafts.remove(index);
        self.renumber();
        true
    }

    /// Ordered toasts from the current form state, titles and messages trimmed.
    pub fn collect(&self) -> Vec<Toast> {
        self.drafts
            .iter()
            .map(|draft| Toast {
                id: draft.id.clone(),
                title: draft.title.trim().to_string(),
                message: draft.message.trim().to_string(),
                kind: draft.kind,
                position: draft.position,
                duration: draft.duration,
                auto_hide: draft.auto_hide,
            })
            .collect()
    }

    /// Replace the working list with drafts derived from the stored
    /// collection, when there is one. A load failure is non-fatal: editing
    /// proceeds from the current (usually empty) list.
    pub async fn load_existing(&mut self) {
        match self.api.load().await {
            Ok(collection) if !collection.toasts.is_empty() => {
                self.drafts.clear();
                self.counter = 0;
                let count = collection.toasts.len();
                for toast in &collection.toasts {
                    self.add_entry(Some(toast));
                }
                self.view.show_status(
                    StatusLevel::Success,
                    &format!("Loaded {count} toast(s) from server"),
                );
            }
            Ok(_) => {}
            Err(err) => {
                debug!(
                    target = "toastdeck::editor",
                    error = %err,
                    "could not load existing toasts"
                );
            }
        }
    }

    /// Bootstrap policy: the editor is never shown with zero rows.
    pub fn ensure_populated(&mut self) {
        if self.drafts.is_empty() {
            self.add_entry(None);
        }
    }

    /// Collect, validate and submit. The save control is disabled for the
    /// duration of the request and re-enabled on every outcome.
    pub async fn save(&mut self) {
        let collected = self.collect();
        if let Err(violation) = toasts::validate_drafts(&collected) {
            self.view
                .show_status(StatusLevel::Error, &violation.to_string());
            return;
        }

        self.view.show_status(StatusLevel::Info, "Saving...");
        self.view.set_save_enabled(false);
        let result = self.api.save(&collected).await;
        self.view.set_save_enabled(true);

        match result {
            Ok(_) => self
                .view
                .show_status(StatusLevel::Success, "Toasts saved successfully!"),
            Err(err) if err.is_server_reported() => self
                .view
                .show_status(StatusLevel::Error, &format!("Error: {err}")),
            Err(err) => self
                .view
                .show_status(StatusLevel::Error, &format!("Network error: {err}")),
        }
    }

    /// Validate, then replay every entry through the renderer with a fixed
    /// stagger so the toasts animate in sequence rather than all at once.
    pub fn preview(&mut self, now: Instant) {
        let collected = self.collect();
        if let Err(violation) = toasts::validate_drafts(&collected) {
            self.view
                .show_status(StatusLevel::Error, &violation.to_string());
            return;
        }

        self.screen.clear();
        for (index, toast) in collected.into_iter().enumerate() {
            self.screen
                .schedule_show(toast, now + PREVIEW_STAGGER * index as u32);
        }
    }

    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!(
            "toast-{}-{}",
            self.counter,
            toasts::epoch_ms(OffsetDateTime::now_utc())
        )
    }

    fn renumber(&mut self) {
        for (index, draft) in self.drafts.iter_mut().enumerate() {
            draft.number = index + 1;
        }
    }
}
