//! The page's conventional behaviors: alert auto-dismiss, form validation,
//! delete confirmation, smooth scrolling, button loading states, and toast
//! notifications. Semantics follow the page templates' markup conventions:
//! dismissible notices carry the `alert` class (plus a category class such as
//! `alert-error`), mandatory fields carry `required`, and selectable options
//! are labels classed `option-label` wrapping one radio input.

use std::collections::HashMap;
use std::fmt;

use crate::dom::{Dom, NodeId};
use crate::page::{ListenerAction, ListenerHandle, Page, TimerAction, TimerId};
use crate::selector;

pub const DEFAULT_DELETE_PROMPT: &str = "Are you sure you want to delete this item?";

const ALERT_DISMISS_DELAY_MS: i64 = 5_000;
const TOAST_DISMISS_DELAY_MS: i64 = 3_000;
const FADE_DURATION_MS: i64 = 300;
const LOADING_LABEL: &str = "Loading...";
const TOAST_STYLE: &str =
    "position: fixed; bottom: 20px; right: 20px; z-index: 9999; min-width: 250px";
const INVALID_FIELD_BORDER: &str = "#f44336";

/// Category of a toast notification, rendered as an `alert-<kind>` class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything `init` wired up, so it can be torn down again.
#[derive(Debug, Default)]
pub struct InitHandle {
    pub(crate) timers: Vec<TimerId>,
    pub(crate) listeners: Vec<ListenerHandle>,
}

impl InitHandle {
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty() && self.listeners.is_empty()
    }
}

/// Handle to one shown toast, for early programmatic dismissal.
#[derive(Debug, Clone, Copy)]
pub struct ToastHandle {
    pub(crate) node: NodeId,
}

impl Page {
    /// Wires the page's load-time behaviors: every current `.alert` element is
    /// scheduled to fade out after five seconds, and every `.option-label`
    /// element checks its nested radio when clicked. Returns a handle that
    /// [`Page::dispose`] uses to cancel the timers and detach the listeners.
    pub fn init(&mut self) -> InitHandle {
        let mut handle = InitHandle::default();

        for alert in select_static(&self.dom, ".alert") {
            let timer = self.schedule(
                ALERT_DISMISS_DELAY_MS,
                TimerAction::FadeOut {
                    node: alert,
                    remove_delay_ms: FADE_DURATION_MS,
                },
            );
            handle.timers.push(timer);
        }

        for label in select_static(&self.dom, ".option-label") {
            let listener = self.add_listener(label, "click", ListenerAction::CheckNestedRadio);
            handle.listeners.push(listener);
        }

        handle
    }

    /// Reverses one `init` call. Timers that already fired and listeners on
    /// removed elements are skipped silently.
    pub fn dispose(&mut self, handle: InitHandle) {
        for timer in handle.timers {
            self.cancel_timer(timer);
        }
        for listener in handle.listeners {
            self.remove_listener(listener);
        }
    }

    /// Returns whether every `required` field inside the form identified by
    /// `form_id` holds a non-whitespace value, marking invalid fields with a
    /// red border and clearing the mark on valid ones. A missing form is
    /// reported as `false` with no side effects.
    pub fn validate_form(&mut self, form_id: &str) -> bool {
        let Some(form) = self.dom.by_id(form_id) else {
            return false;
        };

        let required: Vec<NodeId> = self
            .dom
            .element_descendants(form)
            .into_iter()
            .filter(|field| self.dom.required(*field))
            .collect();

        let mut is_valid = true;
        for field in required {
            let filled = self
                .dom
                .value(field)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false);
            if filled {
                self.dom.style_set(field, "border-color", "");
            } else {
                is_valid = false;
                self.dom.style_set(field, "border-color", INVALID_FIELD_BORDER);
            }
        }
        is_valid
    }

    /// Asks the user to confirm a destructive action. The prompt is recorded
    /// and answered from the queued responses, falling back to the configured
    /// default; `None` uses the stock delete prompt.
    pub fn confirm_delete(&mut self, message: Option<&str>) -> bool {
        let prompt = message.unwrap_or(DEFAULT_DELETE_PROMPT).to_string();
        self.confirm_prompts.push(prompt);
        let accepted = self
            .confirm_responses
            .pop_front()
            .unwrap_or(self.default_confirm_response);
        self.trace_line(format!("[notice] confirm accepted={accepted}"));
        accepted
    }

    /// Smooth-scrolls the viewport to the element with `element_id`. Silent
    /// no-op when the element does not exist.
    pub fn smooth_scroll_to(&mut self, element_id: &str) {
        if let Some(node) = self.dom.by_id(element_id) {
            self.scroll_target = Some(node);
            self.trace_line(format!("[notice] scroll target={element_id}"));
        }
    }

    /// Puts a button into (or out of) its loading state. Entering disables
    /// the button, saves its label, and shows `Loading...`; leaving restores
    /// the saved label and re-enables it. The label is saved only on the
    /// idle-to-loading transition, so repeated loading calls cannot clobber
    /// it. Missing buttons are a silent no-op.
    pub fn set_button_loading(&mut self, button_id: &str, is_loading: bool) {
        let Some(button) = self.dom.by_id(button_id) else {
            return;
        };

        if is_loading {
            if !self.saved_labels.contains_key(&button) {
                let label = self.dom.text_content(button);
                self.saved_labels.insert(button, label);
            }
            self.dom.set_disabled(button, true);
            self.dom.set_text_content(button, LOADING_LABEL);
        } else {
            self.dom.set_disabled(button, false);
            if let Some(label) = self.saved_labels.remove(&button) {
                self.dom.set_text_content(button, label.as_str());
            }
        }
    }

    /// Shows a toast notification: a fixed-position notice appended to the
    /// body, classed `alert alert-<kind>`, that fades out after three seconds.
    /// Clicking the toast dismisses it early, as does passing the returned
    /// handle to [`Page::dismiss_toast`]. Concurrent toasts stack
    /// independently.
    pub fn show_toast(&mut self, message: &str, kind: ToastKind) -> ToastHandle {
        let parent = self.body_or_root();
        let mut attrs = HashMap::new();
        attrs.insert("class".to_string(), format!("alert alert-{kind}"));
        attrs.insert("style".to_string(), TOAST_STYLE.to_string());
        let node = self.dom.create_element(parent, "div".into(), attrs);
        if !message.is_empty() {
            self.dom.create_text(node, message.to_string());
        }

        self.add_listener(node, "click", ListenerAction::DismissNotice);
        self.schedule(
            TOAST_DISMISS_DELAY_MS,
            TimerAction::FadeOut {
                node,
                remove_delay_ms: FADE_DURATION_MS,
            },
        );
        self.trace_line(format!("[notice] toast kind={kind} node={node:?}"));
        ToastHandle { node }
    }

    /// Dismisses a toast before its timer expires. Returns whether the toast
    /// was still present.
    pub fn dismiss_toast(&mut self, handle: ToastHandle) -> bool {
        self.dismiss_notice(handle.node)
    }

    fn body_or_root(&self) -> NodeId {
        self.dom
            .element_descendants(self.dom.root)
            .into_iter()
            .find(|node| {
                self.dom
                    .tag_name(*node)
                    .map(|tag| tag.eq_ignore_ascii_case("body"))
                    .unwrap_or(false)
            })
            .unwrap_or(self.dom.root)
    }
}

// The wiring selectors are fixed strings; a parse failure would be a bug in
// this crate, not caller input, so it degrades to "no matches".
fn select_static(dom: &Dom, sel: &str) -> Vec<NodeId> {
    selector::select_all(dom, sel).unwrap_or_default()
}
