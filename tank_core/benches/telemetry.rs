use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tank_core::{LogEntry, PumpStatus, SharedTank, TankStatus};

fn filled_tank() -> SharedTank {
    let shared = SharedTank::new();
    shared.update(|st| {
        st.set_level(63.4);
        st.set_status(TankStatus::Filling, PumpStatus::On);
        st.record_fill("10:11:12".into(), 7);
        for i in 0..40 {
            st.append(LogEntry::new(&format!("10:00:{:02}", i % 60), "Pump ON (low level)"));
        }
    });
    shared
}

fn bench_snapshot(c: &mut Criterion) {
    let shared = filled_tank();
    c.bench_function("snapshot_full_log", |b| {
        b.iter(|| black_box(shared.snapshot()));
    });
}

fn bench_append(c: &mut Criterion) {
    let shared = filled_tank();
    c.bench_function("append_event", |b| {
        b.iter(|| shared.append_event(black_box(LogEntry::new("10:00:00", "Tank FULL, pump OFF"))));
    });
}

fn bench_cycle_commit(c: &mut Criterion) {
    let shared = filled_tank();
    c.bench_function("cycle_commit", |b| {
        b.iter(|| {
            shared.update(|st| {
                st.set_level(black_box(64.0));
                st.set_status(TankStatus::Filling, PumpStatus::On);
            });
        });
    });
}

criterion_group!(benches, bench_snapshot, bench_append, bench_cycle_commit);
criterion_main!(benches);
