use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tangent::ast::Instruction;
use tangent::dataflow::FunctionFlow;
use tangent::expr::Expr;
use tangent::resolve::ModuleId;

/// Chain of locals: v1 = x * x, v2 = v1 * x, ..., return vN.
fn chain(len: usize) -> Vec<Instruction> {
    let mut instructions = vec![Instruction::Parameter {
        name: "x".to_string(),
        default: None,
    }];
    let mut previous = "x".to_string();
    for i in 1..=len {
        let name = format!("v{}", i);
        instructions.push(Instruction::Local {
            name: name.clone(),
            init: Some(Expr::mul(Expr::variable(&previous), Expr::variable("x"))),
        });
        previous = name;
    }
    instructions.push(Instruction::Return {
        value: Expr::variable(&previous),
    });
    instructions
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for len in [8usize, 32, 128] {
        let instructions = chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &instructions, |b, instructions| {
            b.iter(|| {
                FunctionFlow::parse(ModuleId::new("bench"), "f", black_box(instructions))
                    .expect("parse")
            })
        });
    }
    group.finish();
}

fn bench_differentiate(c: &mut Criterion) {
    let mut group = c.benchmark_group("differentiate");
    for len in [8usize, 32, 128] {
        let flow = FunctionFlow::parse(ModuleId::new("bench"), "f", &chain(len)).expect("parse");
        group.bench_with_input(BenchmarkId::from_parameter(len), &flow, |b, flow| {
            b.iter(|| black_box(flow).differentiate())
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let flow = FunctionFlow::parse(ModuleId::new("bench"), "f", &chain(64)).expect("parse");
    let tangent = flow.differentiate();
    c.bench_function("render_tangent", |b| b.iter(|| black_box(&tangent).text()));
}

criterion_group!(benches, bench_parse, bench_differentiate, bench_render);
criterion_main!(benches);
