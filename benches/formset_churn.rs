use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use formwork::choice::{ChoiceStore, ChoiceTable};
use formwork::config::Settings;
use formwork::dom::{Dom, MemoryDom};
use formwork::enhance::NoopEnhancer;
use formwork::page::PageSession;

fn package_page(rows: usize) -> MemoryDom {
    let mut dom = MemoryDom::new();
    let body = dom.body();
    let container = dom.element(body, "div", &[("class", "formsets-form")]);
    dom.element(
        container,
        "input",
        &[("type", "hidden"), ("id", "id_form-TOTAL_FORMS"), ("name", "form-TOTAL_FORMS"), ("value", "0")],
    );
    let template = dom.element(body, "div", &[("id", "id_empty_packages")]);
    dom.set_hidden(&template, true);

    for (parent, index) in (0..rows)
        .map(|i| (None, i.to_string()))
        .chain(std::iter::once((Some(template), "__prefix__".to_string())))
    {
        let row = match parent {
            Some(template) => template,
            None => dom.element(
                container,
                "div",
                &[("class", "formset-form"), ("data-prefix", "form"), ("data-formset_id", "packages")],
            ),
        };
        for field in ["package_type", "length", "width", "height", "weight"] {
            let id = format!("id_form-{}-{}", index, field);
            let name = format!("form-{}-{}", index, field);
            dom.element(row, "label", &[("for", id.as_str())]);
            dom.element(row, "input", &[("id", id.as_str()), ("name", name.as_str())]);
        }
    }
    dom
}

fn benchmark_add_remove_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("formset_churn");

    for rows in [1usize, 10, 50] {
        group.throughput(Throughput::Elements(2));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            let mut dom = package_page(rows);
            let mut session = PageSession::bind(&mut dom, Settings::default(), ChoiceStore::new(), NoopEnhancer);
            let add = *session.formsets().group("form").unwrap().add_control();

            b.iter(|| {
                session.handle_click(&mut dom, black_box(&add));
                let remove = *session.formsets().group("form").unwrap().remove_controls().last().unwrap();
                session.handle_click(&mut dom, black_box(&remove));
            });
        });
    }

    group.finish();
}

fn benchmark_region_cascade(c: &mut Criterion) {
    let mut dom = MemoryDom::new();
    let body = dom.body();
    let form = dom.element(body, "form", &[("id", "ef-form")]);
    let region = dom.element(form, "select", &[("id", "id_region")]);
    dom.option(region, "NORTH IRELAND", "Northern Ireland");
    dom.option(region, "DUBLIN", "Dublin");
    dom.element(form, "select", &[("id", "id_county")]);
    dom.element(form, "input", &[("id", "id_postcode")]);

    let counties = |prefix: &str| ChoiceTable::new((0..32).map(|i| (format!("{}{}", prefix, i), format!("County {}", i))));
    let store = ChoiceStore::new()
        .with_choices("ni_counties", counties("NI"))
        .with_choices("ie_counties", counties("IE"));
    let mut session = PageSession::bind(&mut dom, Settings::default(), store, NoopEnhancer);

    let mut selected = ["DUBLIN", "NORTH IRELAND"].into_iter().cycle();
    c.bench_function("region_cascade_change", |b| {
        b.iter(|| {
            if let Some(value) = selected.next() {
                dom.set_value(&region, value);
            }
            session.handle_change(&mut dom, black_box(&region))
        });
    });
}

criterion_group!(benches, benchmark_add_remove_churn, benchmark_region_cascade);
criterion_main!(benches);
