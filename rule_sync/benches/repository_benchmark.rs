use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rule_model::{FlowRuleEntity, RuleBase};
use rule_sync::{RuleRepository, SyncOrchestrator};

fn flow(app: &str, machine: usize) -> FlowRuleEntity {
    FlowRuleEntity::new(
        RuleBase::new(app, format!("10.0.{}.{}", machine / 256, machine % 256), 8719),
        "/orders",
        100.0,
    )
}

fn populated(apps: usize, per_app: usize) -> RuleRepository<FlowRuleEntity> {
    let repo = RuleRepository::new(Arc::new(SyncOrchestrator::disabled()));
    for a in 0..apps {
        let app = format!("app{}", a);
        for m in 0..per_app {
            repo.save(flow(&app, m)).expect("local save");
        }
    }
    repo
}

pub fn save_bench(c: &mut Criterion) {
    let repo = populated(10, 100);
    c.bench_function("save_new_rule", |b| {
        b.iter(|| repo.save(black_box(flow("app0", 7))))
    });
}

pub fn find_by_app_bench(c: &mut Criterion) {
    let repo = populated(10, 100);
    c.bench_function("find_all_by_app_100", |b| {
        b.iter(|| repo.find_all_by_app(black_box("app3")))
    });
}

criterion_group!(benches, save_bench, find_by_app_bench);
criterion_main!(benches);
