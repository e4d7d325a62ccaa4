use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use tinysync::{AtomicBitField64, DiagnosticRwLock, SpinLock, TaskList};

fn bench_bitfield(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitfield");

    group.bench_function("std_fetch_or", |b| {
        let word = AtomicU64::new(0);
        b.iter(|| {
            word.fetch_or(black_box(0b1010), Ordering::AcqRel);
            word.fetch_and(black_box(!0b1010), Ordering::AcqRel)
        })
    });

    group.bench_function("cas_or_clear", |b| {
        let field = AtomicBitField64::new();
        b.iter(|| {
            field.or(black_box(0b1010));
            field.clear(black_box(0b1010))
        })
    });

    group.bench_function("cas_or_contended_4", |b| {
        let field = AtomicBitField64::new();
        b.iter(|| {
            thread::scope(|s| {
                for t in 0..4_u32 {
                    let field = &field;
                    s.spawn(move || {
                        for i in 0..1000_u32 {
                            field.xor(1 << ((t * 16 + i) % 64));
                        }
                    });
                }
            });
            black_box(field.get())
        })
    });

    group.finish();
}

fn bench_locks(c: &mut Criterion) {
    let mut group = c.benchmark_group("locks");

    group.bench_function("std_mutex_uncontended", |b| {
        let m = Mutex::new(());
        b.iter(|| drop(black_box(m.lock().unwrap())))
    });

    group.bench_function("spin_lock_uncontended", |b| {
        let lock = SpinLock::new();
        b.iter(|| {
            lock.lock();
            lock.unlock();
        })
    });

    group.bench_function("diagnostic_rwlock_uncontended", |b| {
        let lock = DiagnosticRwLock::new();
        b.iter(|| {
            lock.lock();
            lock.unlock();
        })
    });

    group.bench_function("diagnostic_rwlock_read", |b| {
        let lock = DiagnosticRwLock::new();
        b.iter(|| {
            lock.read_lock();
            lock.read_unlock();
        })
    });

    group.finish();
}

fn bench_task_list(c: &mut Criterion) {
    c.bench_function("task_list_run_100", |b| {
        b.iter(|| {
            let list = TaskList::new();
            for i in 0..100_u64 {
                list.add(move || {
                    black_box(i);
                });
            }
            list.run()
        })
    });
}

criterion_group!(benches, bench_bitfield, bench_locks, bench_task_list);
criterion_main!(benches);
