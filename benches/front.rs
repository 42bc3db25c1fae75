use criterion::{Criterion, black_box, criterion_group, criterion_main};

use clangen_front::document::MemoryDocument;
use clangen_front::render::{PanelRegistry, mediation_panels, wrap_to_width};
use clangen_front::screens::{MediationController, MediationView, ScreenContext};
use clangen_front::theme::{THEME_PROPERTIES, ThemeEditor};
use clangen_front::{Cat, InMemorySim};
use std::sync::Arc;

fn theme_css(c: &mut Criterion) {
    let mut editor = ThemeEditor::new();
    for (index, (name, _)) in THEME_PROPERTIES.iter().enumerate() {
        editor
            .set_property(name, format!("rgb({index}, {index}, {index})"))
            .expect("known property");
    }
    editor.set_extra_css(".cat-card { border-radius: 4px; }");

    c.bench_function("theme_generate_css", |b| {
        b.iter(|| black_box(editor.generate_css()));
    });
}

fn mounted_screen() -> MediationController {
    let clan: Vec<Cat> = (0..400)
        .map(|i| Cat::new(format!("c{i}"), format!("Cat{i}"), "warrior"))
        .collect();
    let sim = InMemorySim::demo().with_clan(clan);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");
    let mut controller = MediationController::new(Arc::new(sim), ScreenContext::default());
    runtime.block_on(controller.mount(&mut MemoryDocument::new()));
    controller.select_mediator("1");
    controller.select_subjects(vec!["c10".into(), "c200".into()]);
    controller
}

fn mediation_view(c: &mut Criterion) {
    let controller = mounted_screen();

    c.bench_function("mediation_can_attempt", |b| {
        b.iter(|| black_box(controller.can_attempt()));
    });

    c.bench_function("mediation_view_to_panels", |b| {
        let mut registry = PanelRegistry::new();
        b.iter(|| {
            let view: MediationView = controller.view();
            registry.sync(mediation_panels(black_box(&view)));
            black_box(registry.take_dirty());
        });
    });
}

fn wrapping(c: &mut Criterion) {
    let text = "Jayfeather helped Lionblaze and Cinderheart talk through their differences. "
        .repeat(20);
    c.bench_function("wrap_narrative", |b| {
        b.iter(|| black_box(wrap_to_width(black_box(&text), 60)));
    });
}

criterion_group!(benches, theme_css, mediation_view, wrapping);
criterion_main!(benches);
