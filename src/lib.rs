//! # Formwork - Dynamic Form Composition Engine
//!
//! Formwork is the interaction layer for server-rendered forms. It binds once
//! to a rendered page and keeps dependent form state consistent for the rest
//! of the page's life.
//!
//! ## Features
//!
//! - **Confirm-and-Submit**: state-changing links are confirmed, then submitted
//!   through one owned hidden form instead of navigated to
//! - **Formsets**: add/remove repeatable sub-forms with contiguous row indices
//! - **Cascades**: driver fields repopulate choice lists or pre-fill row siblings
//! - **Remote schemas**: a driver value fetches a schema and materializes rows,
//!   dropping stale responses
//! - **Unit labels**: decorative suffixes that follow a linked field
//!
//! ## Quick Start
//!
//! ```rust
//! use formwork::choice::ChoiceStore;
//! use formwork::config::Settings;
//! use formwork::dom::MemoryDom;
//! use formwork::enhance::NoopEnhancer;
//! use formwork::page::PageSession;
//!
//! let mut dom = MemoryDom::new();
//! let session = PageSession::bind(&mut dom, Settings::default(), ChoiceStore::new(), NoopEnhancer);
//! assert!(session.diagnostics().is_empty());
//! ```
//!
//! ## Architecture
//!
//! The engine never touches a browser directly:
//! - **Dom**: the document abstraction every binder is written against
//! - **Binders**: cascade, formset, schema, submit and units
//! - **Page**: one session per page, routing change and click events
//! - **Config**: settings with defaults matching the server's markup

pub mod binding;
pub mod cascade;
pub mod choice;
pub mod config;
pub mod dom;
pub mod enhance;
pub mod error;
pub mod formset;
pub mod page;
pub mod schema;
pub mod submit;
pub mod units;

pub use binding::{BinderRegistry, BindingDescriptor, DriverKey};
pub use choice::{ChoiceStore, ChoiceTable};
pub use config::Settings;
pub use dom::{Dom, MemoryDom};
pub use error::{EnhanceError, FetchError, FormworkError, FormworkResult};
pub use page::{ClickOutcome, PageSession};
