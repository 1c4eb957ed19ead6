//! Browser binding for the formwork engine.
//!
//! Binds the engine to the page on load, then routes delegated `change` and
//! `click` events from the document to the page session.

use std::cell::RefCell;
use std::rc::Rc;

use formwork::page::PageSession;
use formwork::schema::SchemaFetcher;
use formwork::submit::ConfirmRequest;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event};

mod api;
mod confirm;
mod enhance;
mod globals;
mod web_dom;

pub use api::GlooSchemaFetcher;
pub use enhance::JsEnhancer;
pub use web_dom::WebDom;

use confirm::ConfirmModal;

struct Page {
    dom: WebDom,
    session: PageSession<WebDom, JsEnhancer>,
}

type SharedPage = Rc<RefCell<Page>>;

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn on_change(page: SharedPage, event: Event) {
    let Some(target) = event_element(&event) else {
        return;
    };
    let tickets = {
        let mut page = page.borrow_mut();
        let Page { dom, session } = &mut *page;
        session.handle_change(dom, &target)
    };

    for ticket in tickets {
        let page = page.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = GlooSchemaFetcher.fetch_schema(&ticket.url).await;
            let mut page = page.borrow_mut();
            let Page { dom, session } = &mut *page;
            session.complete_fetch(dom, &ticket, result);
        });
    }
}

fn on_click(page: SharedPage, pending: RwSignal<Option<ConfirmRequest>>, event: Event) {
    let Some(target) = event_element(&event) else {
        return;
    };
    let outcome = {
        let mut page = page.borrow_mut();
        let Page { dom, session } = &mut *page;
        session.handle_click(dom, &target)
    };
    if outcome.prevent_default {
        event.prevent_default();
    }
    if let Some(request) = outcome.confirm {
        pending.set(Some(request));
    }
}

fn listen(document: &Document, kind: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(e) = document.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()) {
        tracing::error!("Could not listen for {}: {:?}", kind, e);
    }
    closure.forget();
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    let Some(mut dom) = WebDom::new() else {
        log::error!("formwork: no document to bind to");
        return;
    };
    let settings = globals::settings(&dom);
    let store = globals::choice_store(dom.window());
    let session = PageSession::bind(&mut dom, settings, store, JsEnhancer::default());
    for diagnostic in session.diagnostics() {
        tracing::error!("{}", diagnostic);
    }

    let document = dom.document().clone();
    let page: SharedPage = Rc::new(RefCell::new(Page { dom, session }));

    let pending = RwSignal::new(None::<ConfirmRequest>);
    let answer = RwSignal::new(None::<(ConfirmRequest, bool)>);
    leptos::mount::mount_to_body(move || view! { <ConfirmModal pending=pending answer=answer/> });

    let answered = page.clone();
    Effect::new(move |_| {
        if let Some((request, accepted)) = answer.get() {
            let mut page = answered.borrow_mut();
            let Page { dom, session } = &mut *page;
            session.resolve_confirmation(dom, &request, accepted);
        }
    });

    let changed = page.clone();
    listen(&document, "change", move |event| on_change(changed.clone(), event));
    listen(&document, "click", move |event| on_click(page.clone(), pending, event));
}
