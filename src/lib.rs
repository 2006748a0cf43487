//! Deterministic in-memory page runtime with DOM utility helpers.
//!
//! `page_toolkit` hosts a small HTML page as an arena DOM and wires the
//! page's conventional behaviors to it: auto-dismissing alert banners,
//! required-field form validation, delete confirmation, smooth scrolling,
//! button loading states, toast notifications, date formatting, and
//! radio option-label click handling. Time never passes on its own; all
//! timed behavior runs against a virtual clock driven by the caller, so
//! every transient notice is observable and every timer is cancellable.
//!
//! ```
//! use page_toolkit::{Page, ToastKind};
//!
//! fn main() -> page_toolkit::Result<()> {
//!     let mut page = Page::from_html("<div class='alert alert-info'>Saved</div>")?;
//!     let handle = page.init();
//!     page.advance_time(5_300)?;
//!     page.assert_not_exists(".alert")?;
//!     page.dispose(handle);
//!
//!     page.show_toast("Welcome back", ToastKind::Success);
//!     page.assert_exists(".alert-success")?;
//!     Ok(())
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;

mod datefmt;
mod dom;
mod html;
mod page;
mod page_utils;
mod selector;

pub use datefmt::format_date;
pub use page::{ListenerHandle, Page, PendingTimer, TimerId};
pub use page_utils::{InitHandle, ToastHandle, ToastKind, DEFAULT_DELETE_PROMPT};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    PageRuntime(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::PageRuntime(msg) => write!(f, "page runtime error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
