//! Client classification middleware.
//!
//! Short-circuits with `403 Forbidden` and a plain-text message when the
//! User-Agent fails the configured policy; otherwise the request reaches the
//! wrapped handler untouched.
//!
//! ```ignore
//! let guard = ClientGuard::block_bots(classifier, true).with_message("No bots here");
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(middleware::from_fn_with_state(guard, client_guard_middleware));
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header::USER_AGENT, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::agent::ClientClassifier;
use crate::observability::metrics;

pub const DEFAULT_BOT_MESSAGE: &str = "Bot access denied";
pub const DEFAULT_BROWSER_MESSAGE: &str = "Browser access only";

fn default_bot_message() -> String {
    DEFAULT_BOT_MESSAGE.to_string()
}

fn default_browser_message() -> String {
    DEFAULT_BROWSER_MESSAGE.to_string()
}

fn default_true() -> bool {
    true
}

/// Which requests the guard rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GuardPolicy {
    /// Let everything through.
    Off,
    /// Reject automated clients.
    BlockBots {
        /// Let listed search engine and preview crawlers through.
        #[serde(default = "default_true")]
        allow_legitimate: bool,
        #[serde(default = "default_bot_message")]
        message: String,
    },
    /// Reject anything that is not a browser.
    BrowserOnly {
        #[serde(default = "default_browser_message")]
        message: String,
    },
}

impl Default for GuardPolicy {
    fn default() -> Self {
        GuardPolicy::BlockBots {
            allow_legitimate: true,
            message: default_bot_message(),
        }
    }
}

impl GuardPolicy {
    pub fn block_bots(allow_legitimate: bool) -> Self {
        GuardPolicy::BlockBots {
            allow_legitimate,
            message: default_bot_message(),
        }
    }

    pub fn browser_only() -> Self {
        GuardPolicy::BrowserOnly {
            message: default_browser_message(),
        }
    }

    /// Replace the rejection message. No effect on `Off`.
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        match &mut self {
            GuardPolicy::Off => {}
            GuardPolicy::BlockBots { message, .. } | GuardPolicy::BrowserOnly { message } => {
                *message = msg.into();
            }
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            GuardPolicy::Off => "off",
            GuardPolicy::BlockBots { .. } => "block_bots",
            GuardPolicy::BrowserOnly { .. } => "browser_only",
        }
    }

    /// Message sent on rejection; an empty configured message means the default.
    pub fn message(&self) -> &str {
        match self {
            GuardPolicy::Off => "",
            GuardPolicy::BlockBots { message, .. } if message.is_empty() => DEFAULT_BOT_MESSAGE,
            GuardPolicy::BrowserOnly { message } if message.is_empty() => DEFAULT_BROWSER_MESSAGE,
            GuardPolicy::BlockBots { message, .. } | GuardPolicy::BrowserOnly { message } => {
                message.as_str()
            }
        }
    }

    /// Whether a request carrying `user_agent` must be rejected.
    pub fn rejects(&self, classifier: &ClientClassifier, user_agent: &str) -> bool {
        match self {
            GuardPolicy::Off => false,
            GuardPolicy::BlockBots {
                allow_legitimate, ..
            } => classifier.is_automated(user_agent, *allow_legitimate),
            GuardPolicy::BrowserOnly { .. } => !classifier.is_browser(user_agent),
        }
    }
}

/// State for [`client_guard_middleware`].
///
/// Cloning is cheap; clones share the classifier and the policy, so a
/// [`reload`](Self::reload) is seen by every router holding a clone.
/// [`with_message`](Self::with_message) detaches the returned guard.
#[derive(Debug, Clone)]
pub struct ClientGuard {
    classifier: ClientClassifier,
    policy: Arc<ArcSwap<GuardPolicy>>,
}

impl ClientGuard {
    pub fn new(classifier: ClientClassifier, policy: GuardPolicy) -> Self {
        Self {
            classifier,
            policy: Arc::new(ArcSwap::from_pointee(policy)),
        }
    }

    /// Reject automated clients with the default message.
    pub fn block_bots(classifier: ClientClassifier, allow_legitimate: bool) -> Self {
        Self::new(classifier, GuardPolicy::block_bots(allow_legitimate))
    }

    /// Reject non-browsers with the default message.
    pub fn browser_only(classifier: ClientClassifier) -> Self {
        Self::new(classifier, GuardPolicy::browser_only())
    }

    /// Replace the rejection message on this guard only.
    ///
    /// The returned guard gets its own policy cell, so clones made before
    /// this call keep their message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let policy = GuardPolicy::clone(&self.policy.load()).with_message(message);
        self.policy = Arc::new(ArcSwap::from_pointee(policy));
        self
    }

    pub fn policy(&self) -> Arc<GuardPolicy> {
        self.policy.load_full()
    }

    /// Swap the active policy.
    pub fn reload(&self, policy: GuardPolicy) {
        tracing::info!(policy = policy.name(), "Guard policy updated");
        self.policy.store(Arc::new(policy));
    }

    pub fn classifier(&self) -> &ClientClassifier {
        &self.classifier
    }

    /// Evaluate the policy for `user_agent`; `Some(message)` means reject.
    pub fn check(&self, user_agent: &str) -> Option<String> {
        let policy = self.policy.load();
        if !policy.rejects(&self.classifier, user_agent) {
            return None;
        }

        tracing::debug!(
            policy = policy.name(),
            user_agent = %user_agent,
            kind = self.classifier.kind(user_agent).as_str(),
            "Request rejected by client guard"
        );
        metrics::record_rejection(policy.name());
        Some(policy.message().to_string())
    }
}

/// Reject requests whose User-Agent fails the guard's policy.
pub async fn client_guard_middleware(
    State(guard): State<ClientGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    metrics::record_request();

    // Absent or non-text values are treated as an empty User-Agent.
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match guard.check(user_agent) {
        Some(message) => (StatusCode::FORBIDDEN, message).into_response(),
        None => next.run(request).await,
    }
}
