//! Confirm-and-submit interception for state-changing links.
//!
//! Two rules are bound once at page initialisation:
//!
//! * links carrying `data-confirm` ask the user first, then submit, open a
//!   named window or navigate depending on their method and target;
//! * links carrying `data-method="POST"` without a confirmation (and not
//!   opted out) always submit through the shared form.
//!
//! POST-class actions go through a [`SubmissionChannel`], which owns the
//! page's hidden form and never lets inputs from an earlier submission leak
//! into the next one.

use crate::config::SubmitSettings;
use crate::dom::{Dom, Query};
use crate::error::{FormworkError, FormworkResult};

pub const CONFIRM_ATTRIBUTE: &str = "data-confirm";
pub const CONFIRM_TITLE_ATTRIBUTE: &str = "data-confirm-title";
pub const METHOD_ATTRIBUTE: &str = "data-method";

const DATA_PREFIX: &str = "data-";
const METHOD_KEY: &str = "method";
/// Declared method that marks a link for the post-only rule
const POST_METHOD: &str = "POST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Post,
    /// Any idempotent method; carried out as a plain navigation
    Other(String),
}

impl Method {
    /// Reads a method hint, falling back to `default` when absent or empty
    pub fn parse(hint: Option<&str>, default: &str) -> Self {
        let raw = hint.filter(|h| !h.is_empty()).unwrap_or(default);
        if raw.eq_ignore_ascii_case("post") {
            Self::Post
        } else {
            Self::Other(raw.to_ascii_lowercase())
        }
    }

    pub fn is_post(&self) -> bool {
        matches!(self, Self::Post)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub message: String,
    pub title: Option<String>,
}

/// Which rule bound a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRule {
    Confirm,
    PostOnly,
}

/// Everything a click needs, read from the element once at bind time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLink {
    pub href: String,
    pub method: Method,
    pub confirm: Option<Confirmation>,
    pub target: Option<String>,
    /// Extra `data-*` pairs submitted as hidden inputs, keys in camelCase
    pub payload: Vec<(String, String)>,
    pub rule: LinkRule,
}

impl ActionLink {
    pub fn parse<D: Dom>(dom: &D, node: &D::Node, rule: LinkRule, settings: &SubmitSettings) -> Self {
        let method = Method::parse(dom.attribute(node, METHOD_ATTRIBUTE).as_deref(), &settings.default_method);
        let confirm = match rule {
            LinkRule::Confirm => Some(Confirmation {
                message: dom.attribute(node, CONFIRM_ATTRIBUTE).unwrap_or_default(),
                title: dom.attribute(node, CONFIRM_TITLE_ATTRIBUTE).filter(|t| !t.is_empty()),
            }),
            LinkRule::PostOnly => None,
        };
        let payload = dom
            .attributes(node)
            .into_iter()
            .filter_map(|(name, value)| {
                let key = data_key(name.strip_prefix(DATA_PREFIX)?);
                (key != METHOD_KEY).then_some((key, value))
            })
            .collect();

        Self {
            href: dom.attribute(node, "href").unwrap_or_default(),
            method,
            confirm,
            target: dom.attribute(node, "target").filter(|t| !t.is_empty()),
            payload,
            rule,
        }
    }
}

/// Key a `data-*` attribute is exposed under: `confirm-title` becomes `confirmTitle`
pub fn data_key(suffix: &str) -> String {
    let mut key = String::with_capacity(suffix.len());
    let mut chars = suffix.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(next) if c == '-' && next.is_ascii_lowercase() => {
                key.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => key.push(c),
        }
    }
    key
}

/// A side effect on the browsing context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Submit { url: String, fields: Vec<(String, String)> },
    OpenWindow { url: String, target: String },
    Navigate { url: String },
}

/// A click waiting on the user's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub link: ActionLink,
}

impl ConfirmRequest {
    pub fn message(&self) -> &str {
        self.link.confirm.as_ref().map(|c| c.message.as_str()).unwrap_or_default()
    }

    pub fn title(&self) -> Option<&str> {
        self.link.confirm.as_ref().and_then(|c| c.title.as_deref())
    }
}

/// What an intercepted click turns into. Default navigation is always suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    Confirm(ConfirmRequest),
    Perform(Action),
    /// The link points at the no-op href
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct Interceptor<N> {
    links: Vec<(N, ActionLink)>,
    noop_href: String,
}

impl<N: Clone + PartialEq> Interceptor<N> {
    /// Binds both rules to the links present on the page now
    pub fn bind<D: Dom<Node = N>>(dom: &D, settings: &SubmitSettings) -> Self {
        let mut links = Vec::new();
        for node in dom.query(None, &Query::attr(CONFIRM_ATTRIBUTE)) {
            links.push((node.clone(), ActionLink::parse(dom, &node, LinkRule::Confirm, settings)));
        }
        let post_only = Query::attr(METHOD_ATTRIBUTE);
        for node in dom.query(None, &post_only) {
            let declared = dom.attribute(&node, METHOD_ATTRIBUTE);
            if declared.as_deref() != Some(POST_METHOD)
                || dom.has_attribute(&node, CONFIRM_ATTRIBUTE)
                || dom.has_class(&node, &settings.opt_out_class)
            {
                continue;
            }
            links.push((node.clone(), ActionLink::parse(dom, &node, LinkRule::PostOnly, settings)));
        }
        tracing::debug!("Intercepting {} action links", links.len());

        Self {
            links,
            noop_href: settings.noop_href.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> impl Iterator<Item = &ActionLink> {
        self.links.iter().map(|(_, link)| link)
    }

    /// True when some bound link submits through the shared form
    pub fn needs_channel(&self) -> bool {
        self.links().any(|l| l.method.is_post())
    }

    /// Bound link at `target` or its nearest bound ancestor
    pub fn link_for<D: Dom<Node = N>>(&self, dom: &D, target: &N) -> Option<&ActionLink> {
        dom.ancestors_inclusive(target)
            .iter()
            .find_map(|candidate| self.links.iter().find(|(n, _)| n == candidate).map(|(_, l)| l))
    }

    /// Resolves a click. `None` means the click is not ours to intercept.
    pub fn click<D: Dom<Node = N>>(&self, dom: &D, target: &N) -> Option<Intercept> {
        let link = self.link_for(dom, target)?;
        let intercept = match link.rule {
            LinkRule::Confirm => Intercept::Confirm(ConfirmRequest { link: link.clone() }),
            LinkRule::PostOnly if link.href == self.noop_href || link.href.is_empty() => Intercept::Suppressed,
            LinkRule::PostOnly => Intercept::Perform(Action::Submit {
                url: link.href.clone(),
                fields: link.payload.clone(),
            }),
        };
        Some(intercept)
    }
}

/// Turns the user's answer into an action. A declined request does nothing.
pub fn resolve(request: &ConfirmRequest, accepted: bool) -> Option<Action> {
    if !accepted {
        tracing::debug!("Confirmation declined for {}", request.link.href);
        return None;
    }
    let link = &request.link;
    let action = match (&link.method, &link.target) {
        (Method::Post, Some(target)) => Action::OpenWindow {
            url: link.href.clone(),
            target: target.clone(),
        },
        (Method::Post, None) => Action::Submit {
            url: link.href.clone(),
            fields: link.payload.clone(),
        },
        (Method::Other(_), _) => Action::Navigate { url: link.href.clone() },
    };
    Some(action)
}

/// Owns the page's shared hidden form
#[derive(Debug, Clone)]
pub struct SubmissionChannel<N> {
    form: N,
    appended: Vec<N>,
}

impl<N: Clone> SubmissionChannel<N> {
    pub fn attach<D: Dom<Node = N>>(dom: &D, form_id: &str) -> FormworkResult<Self> {
        let form = dom
            .element_by_id(form_id)
            .ok_or_else(|| FormworkError::MissingPostForm { id: form_id.to_string() })?;
        Ok(Self {
            form,
            appended: Vec::new(),
        })
    }

    pub fn form(&self) -> &N {
        &self.form
    }

    /// Submits `fields` to `url`, replacing the inputs of the previous call.
    ///
    /// Inputs the page rendered into the form (the CSRF token) are kept.
    pub fn submit<D: Dom<Node = N>>(&mut self, dom: &mut D, url: &str, fields: &[(String, String)]) {
        for stale in self.appended.drain(..) {
            dom.remove(&stale);
        }
        dom.set_attribute(&self.form, "action", url);
        for (name, value) in fields {
            let input = dom.create_element("input");
            dom.set_attribute(&input, "type", "hidden");
            dom.set_attribute(&input, "name", name);
            dom.set_attribute(&input, "value", value);
            dom.append_child(&self.form, &input);
            self.appended.push(input);
        }
        tracing::info!("Submitting {} fields to {}", fields.len(), url);
        dom.submit_form(&self.form);
    }
}

/// Carries out an action. Submissions without a channel are dropped with an error log.
pub fn perform<D: Dom>(dom: &mut D, channel: Option<&mut SubmissionChannel<D::Node>>, action: &Action) {
    match action {
        Action::Submit { url, fields } => match channel {
            Some(channel) => channel.submit(dom, url, fields),
            None => tracing::error!("No submission form on the page, cannot submit to {}", url),
        },
        Action::OpenWindow { url, target } => dom.open_window(url, target),
        Action::Navigate { url } => dom.navigate(url),
    }
}
