//! Benchmarks for attractor integration and frame production.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use strange_attractors::{
    compute::{FamilyProfile, FrameBufferAdapter, Integrator, ParticlePool, SimulationScheduler},
    schema::{
        AttractorParameters, ControlMap, ControlValue, FamilyId, IntegrationMethod, PlatformBudget,
        SimulationConfig, keys,
    },
};

fn setup(family: FamilyId, count: usize, method: IntegrationMethod) -> (Integrator, ParticlePool) {
    let profile = FamilyProfile::for_family(family);
    let config = SimulationConfig {
        particle_count: count,
        method,
        ..Default::default()
    };
    let integrator = Integrator::new(AttractorParameters::defaults(family), &profile, &config);
    let pool = ParticlePool::new(count, profile.seeding.clone(), Some(7))
        .expect("default seeding is valid");
    (integrator, pool)
}

fn bench_integrator_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_step");

    for family in FamilyId::ALL {
        let (integrator, mut pool) = setup(family, 2500, IntegrationMethod::Euler);
        group.bench_with_input(BenchmarkId::from_parameter(family), &family, |b, _| {
            b.iter(|| {
                integrator.step(black_box(&mut pool));
            });
        });
    }

    group.finish();
}

fn bench_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("methods");

    for method in [IntegrationMethod::Euler, IntegrationMethod::Rk4] {
        let (integrator, mut pool) = setup(FamilyId::Lorenz, 2500, method);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", method)),
            &method,
            |b, _| {
                b.iter(|| {
                    integrator.step(black_box(&mut pool));
                });
            },
        );
    }

    group.finish();
}

fn bench_particle_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_count");

    for count in [1000, 2500, 5000, 10_000] {
        let (integrator, mut pool) = setup(FamilyId::NewtonLeipnik, count, IntegrationMethod::Euler);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                integrator.step(black_box(&mut pool));
            });
        });
    }

    group.finish();
}

fn bench_frame_buffer(c: &mut Criterion) {
    let profile = FamilyProfile::for_family(FamilyId::Aizawa);
    let pool = ParticlePool::new(2500, profile.seeding.clone(), Some(3))
        .expect("default seeding is valid");
    let mut adapter = FrameBufferAdapter::new(profile.display, None);
    let config = SimulationConfig::default();

    c.bench_function("frame_buffer_2500", |b| {
        b.iter(|| {
            adapter.update(black_box(&pool), &config, 0.0);
        });
    });
}

fn bench_scheduler_frame(c: &mut Criterion) {
    let mut scheduler = SimulationScheduler::new(PlatformBudget::mobile());
    let mut controls = ControlMap::new();
    controls.insert(keys::PARTICLE_COUNT.into(), ControlValue::from(2500usize));
    scheduler
        .start("thomas", &controls)
        .expect("thomas is a known family");

    c.bench_function("scheduler_frame_thomas_2500", |b| {
        b.iter(|| {
            black_box(scheduler.on_frame(1.0 / 60.0));
        });
    });
}

criterion_group!(
    benches,
    bench_integrator_step,
    bench_methods,
    bench_particle_count,
    bench_frame_buffer,
    bench_scheduler_frame
);
criterion_main!(benches);
