mod common;

use common::*;
use formwork::choice::ChoiceStore;
use formwork::config::Settings;
use formwork::dom::{Dom, MemoryDom};
use formwork::page::PageSession;

#[test]
fn test_bind_enhances_live_selects_only() {
    init_tracing();
    let mut dom = MemoryDom::new();
    region_form(&mut dom, "NORTH IRELAND");
    package_formset(&mut dom, 2, None);
    let enhancer = RecordingEnhancer::default();
    PageSession::bind(&mut dom, Settings::default(), store(), enhancer.clone());

    let seen = enhancer.take();
    assert!(seen.contains(&"id_region".to_string()));
    assert!(seen.contains(&"id_county".to_string()));
    assert!(seen.contains(&"id_form-0-package_type".to_string()));
    assert!(seen.contains(&"id_form-1-package_type".to_string()));
    assert!(seen.iter().all(|id| !id.contains("__prefix__")));
}

#[test]
fn test_added_row_select_is_enhanced() {
    init_tracing();
    let mut dom = MemoryDom::new();
    package_formset(&mut dom, 1, None);
    let enhancer = RecordingEnhancer::default();
    let mut session = PageSession::bind(&mut dom, Settings::default(), store(), enhancer.clone());
    enhancer.take();

    let add = *session.formsets().group("form").unwrap().add_control();
    session.handle_click(&mut dom, &add);

    assert_eq!(enhancer.take(), vec!["id_form-1-package_type"]);
}

#[test]
fn test_repopulated_county_is_enhanced() {
    init_tracing();
    let mut dom = MemoryDom::new();
    region_form(&mut dom, "NORTH IRELAND");
    let enhancer = RecordingEnhancer::default();
    let mut session = PageSession::bind(&mut dom, Settings::default(), store(), enhancer.clone());
    enhancer.take();

    let region = by_id(&dom, "id_region");
    dom.set_value(&region, "CORK");
    session.handle_change(&mut dom, &region);

    assert_eq!(enhancer.take(), vec!["id_county"]);
}

#[tokio::test]
async fn test_rendered_schema_rows_are_enhanced() {
    init_tracing();
    let mut dom = MemoryDom::new();
    product_form(&mut dom);
    let enhancer = RecordingEnhancer::default();
    let mut session = PageSession::bind(&mut dom, Settings::default(), ChoiceStore::new(), enhancer.clone());
    enhancer.take();

    let fetcher = StaticSchemaFetcher::default().with(
        "/products/1/ingredient-choices/",
        r#"[{"name": "Flour", "unit": "kg", "choices": []}, {"name": "Oil", "unit": "l", "choices": []}]"#,
    );
    let driver = by_id(&dom, "id_product_type");
    session.dispatch_change(&mut dom, &driver, &fetcher).await;

    assert_eq!(enhancer.take(), vec!["id_ingredient_0", "id_ingredient_1"]);
}
