use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nonsmooth::test_utils::{random_friction_problem, random_relay_problem};
use nonsmooth::{Driver, SolverId, SolverOptions};

fn friction(c: &mut Criterion) {
    let driver = Driver::friction_contact();
    let mut group = c.benchmark_group("Friction Contact");
    for &nc in &[10, 40] {
        let problem = random_friction_problem(nc, 0.3, 42).expect("valid problem");
        for id in [
            SolverId::Fc3dNsgs,
            SolverId::Fc3dTrescaFixedPoint,
            SolverId::Fc3dFixedPointProjection,
            SolverId::Fc3dExtraGradient,
        ] {
            group.bench_function(BenchmarkId::new(id.name(), nc), |b| {
                b.iter(|| {
                    let mut options = SolverOptions::new(id);
                    driver.solve(&problem, &mut options).expect("solve")
                })
            });
        }
    }
    group.finish();

    let driver = Driver::relay();
    let mut group = c.benchmark_group("Relay");
    let problem = random_relay_problem(60, 42).expect("valid problem");
    for id in [SolverId::RelayPgs, SolverId::RelayLatin] {
        group.bench_function(BenchmarkId::new(id.name(), 60), |b| {
            b.iter(|| {
                let mut options = SolverOptions::new(id);
                driver.solve(&problem, &mut options).expect("solve")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, friction);
criterion_main!(benches);
