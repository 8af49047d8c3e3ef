use leptos::prelude::*;

use crate::html::href;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

/// One-shot notice carried across a redirect in `?msg=` / `?detail=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            text: text.into(),
        }
    }

    /// `?msg=<text>` is a success, `?msg=error&detail=<text>` an error and
    /// `?msg=info&detail=<text>` a neutral notice.
    pub fn from_query(msg: Option<&str>, detail: Option<&str>) -> Option<Self> {
        let msg = msg.filter(|m| !m.is_empty())?;
        Some(match msg {
            "error" => Flash::error(detail.unwrap_or("An error occurred")),
            "info" => Flash::info(detail.unwrap_or_default()),
            _ => Flash::success(msg),
        })
    }

    /// Redirect target carrying this flash plus any extra parameters.
    pub fn location(&self, path: &str, extra: &[(&str, &str)]) -> String {
        let mut params: Vec<(&str, &str)> = extra.to_vec();
        match self.kind {
            FlashKind::Success => params.push(("msg", &self.text)),
            FlashKind::Error => {
                params.push(("msg", "error"));
                params.push(("detail", &self.text));
            }
            FlashKind::Info => {
                params.push(("msg", "info"));
                params.push(("detail", &self.text));
            }
        }
        href(path, &params)
    }
}

#[component]
pub fn FlashMessage(flash: Option<Flash>) -> impl IntoView {
    flash.map(|flash| {
        let bg = match flash.kind {
            FlashKind::Success => "bg-green-500/20 border-green-500/50 text-green-300",
            FlashKind::Error => "bg-red-500/20 border-red-500/50 text-red-300",
            FlashKind::Info => "bg-blue-500/20 border-blue-500/50 text-blue-300",
        };
        view! {
            <div
                class=format!("mx-6 mt-4 px-4 py-3 border text-sm flex items-center justify-between {bg}")
                role="alert"
            >
                <span>{flash.text}</span>
            </div>
        }
    })
}
