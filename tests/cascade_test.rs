mod common;

use common::*;
use formwork::choice::{ChoiceStore, ChoiceTable};
use formwork::config::Settings;
use formwork::dom::{Dom, MemoryDom};
use formwork::enhance::NoopEnhancer;
use formwork::error::FormworkError;
use formwork::page::PageSession;

fn option_keys(dom: &MemoryDom, select_id: &str) -> Vec<String> {
    dom.options(by_id(dom, select_id)).into_iter().map(|(k, _)| k).collect()
}

#[test]
fn test_region_resolves_counties_at_bind_time() {
    init_tracing();
    let mut dom = MemoryDom::new();
    region_form(&mut dom, "NORTH IRELAND");
    let session = PageSession::bind(&mut dom, Settings::default(), store(), NoopEnhancer);

    assert!(session.diagnostics().is_empty());
    assert_eq!(option_keys(&dom, "id_county"), vec!["", "ANTRIM", "DOWN"]);
    assert!(!dom.is_disabled(&by_id(&dom, "id_postcode")));
}

#[test]
fn test_region_change_swaps_counties_and_toggles_postcode() {
    init_tracing();
    let mut dom = MemoryDom::new();
    region_form(&mut dom, "NORTH IRELAND");
    let mut session = PageSession::bind(&mut dom, Settings::default(), store(), NoopEnhancer);

    let county = by_id(&dom, "id_county");
    dom.set_value(&county, "DOWN");
    let region = by_id(&dom, "id_region");
    dom.set_value(&region, "CORK");
    session.handle_change(&mut dom, &region);

    assert_eq!(option_keys(&dom, "id_county"), vec!["", "DUBLIN", "CORK"]);
    assert_eq!(dom.value(&county), "");
    let postcode = by_id(&dom, "id_postcode");
    assert!(dom.is_disabled(&postcode));
    assert_eq!(dom.value(&postcode), "");

    dom.set_value(&region, "NORTH IRELAND");
    session.handle_change(&mut dom, &region);
    assert_eq!(option_keys(&dom, "id_county"), vec!["", "ANTRIM", "DOWN"]);
    assert!(!dom.is_disabled(&postcode));
}

#[test]
fn test_missing_county_table_is_reported() {
    init_tracing();
    let mut dom = MemoryDom::new();
    region_form(&mut dom, "DUBLIN");
    let store = ChoiceStore::new().with_choices("ie_counties", ChoiceTable::new([("DUBLIN", "Dublin")]));
    let session = PageSession::bind(&mut dom, Settings::default(), store, NoopEnhancer);

    assert_eq!(
        session.diagnostics(),
        &[FormworkError::UnknownTable("ni_counties".to_string())]
    );
    assert_eq!(option_keys(&dom, "id_county"), vec![""]);
    assert!(session.registry().is_empty());
}

#[test]
fn test_package_type_fills_only_its_own_row() {
    init_tracing();
    let mut dom = MemoryDom::new();
    package_formset(&mut dom, 2, None);
    let mut session = PageSession::bind(&mut dom, Settings::default(), store(), NoopEnhancer);

    let driver = by_id(&dom, "id_form-1-package_type");
    dom.set_value(&driver, "2");
    session.handle_change(&mut dom, &driver);

    let filled: Vec<String> = DIMENSION_FIELDS
        .iter()
        .map(|f| dom.value(&by_id(&dom, &format!("id_form-1-{}", f))))
        .collect();
    assert_eq!(filled, vec!["40", "50", "60", "12"]);
    for field in DIMENSION_FIELDS {
        assert_eq!(dom.value(&by_id(&dom, &format!("id_form-0-{}", field))), "");
    }
}

#[test]
fn test_unknown_package_type_leaves_row_untouched() {
    init_tracing();
    let mut dom = MemoryDom::new();
    package_formset(&mut dom, 1, None);
    let mut session = PageSession::bind(&mut dom, Settings::default(), store(), NoopEnhancer);

    let driver = by_id(&dom, "id_form-0-package_type");
    dom.set_value(&driver, "1");
    session.handle_change(&mut dom, &driver);
    assert_eq!(dom.value(&by_id(&dom, "id_form-0-weight")), "1.5");

    dom.set_value(&driver, "");
    session.handle_change(&mut dom, &driver);
    assert_eq!(dom.value(&by_id(&dom, "id_form-0-length")), "10");
    assert_eq!(dom.value(&by_id(&dom, "id_form-0-weight")), "1.5");
}

#[test]
fn test_added_package_row_fills_by_its_own_index() {
    init_tracing();
    let mut dom = MemoryDom::new();
    package_formset(&mut dom, 10, None);
    let mut session = PageSession::bind(&mut dom, Settings::default(), store(), NoopEnhancer);

    let add = *session.formsets().group("form").unwrap().add_control();
    session.handle_click(&mut dom, &add);

    let driver = by_id(&dom, "id_form-10-package_type");
    dom.set_value(&driver, "1");
    session.handle_change(&mut dom, &driver);

    assert_eq!(dom.value(&by_id(&dom, "id_form-10-height")), "30");
    assert_eq!(dom.value(&by_id(&dom, "id_form-1-height")), "");
    assert_eq!(dom.value(&by_id(&dom, "id_form-0-height")), "");
}

#[test]
fn test_package_driver_outside_formset_is_ignored() {
    init_tracing();
    let mut dom = MemoryDom::new();
    package_formset(&mut dom, 1, None);
    let body = dom.body();
    let stray = dom.element(
        body,
        "select",
        &[("id", "id_form-0-package_type_return"), ("data-field-id", "package-type")],
    );
    dom.option(stray, "", "---------");
    dom.option(stray, "2", "Pallet");
    let mut session = PageSession::bind(&mut dom, Settings::default(), store(), NoopEnhancer);

    dom.set_value(&stray, "2");
    session.handle_change(&mut dom, &stray);

    for field in DIMENSION_FIELDS {
        assert_eq!(dom.value(&by_id(&dom, &format!("id_form-0-{}", field))), "");
    }
}
