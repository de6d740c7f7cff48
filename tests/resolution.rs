// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the “License”);
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an “AS IS” BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::{HashMap, HashSet};

use tangent::ast::Instruction;
use tangent::dataflow::FunctionFlow;
use tangent::expr::Expr;
use tangent::resolve::{self, naming, ModuleId, Reference, ResolveError};
use tangent::workspace::Workspace;

fn param(name: &str) -> Instruction {
    Instruction::Parameter {
        name: name.to_string(),
        default: None,
    }
}

fn ret(value: Expr) -> Instruction {
    Instruction::Return { value }
}

fn reference(module: &str, name: &str) -> Reference {
    Reference::new(ModuleId::new(module), name)
}

#[test]
fn convention_resolves_into_sibling_module() {
    let mut ws = Workspace::new();
    ws.add_function("maths", "f");
    ws.add_function("maths_", "f_");

    let found = resolve::find_function(&ws, &reference("maths", "f_"))
        .expect("no cycle")
        .expect("declaration");
    assert_eq!(found.module().as_str(), "maths_");
    assert_eq!(found.name(), "f_");
    assert!(found.is_real());
}

#[test]
fn convention_fails_without_sibling_module() {
    let mut ws = Workspace::new();
    ws.add_function("maths", "f");

    let found = resolve::find_function(&ws, &reference("maths", "f_")).expect("no cycle");
    assert!(found.is_none());
}

#[test]
fn colocated_derivative_wins_over_convention() {
    let mut ws = Workspace::new();
    ws.add_function("maths", "f");
    ws.add_function("maths", "f_");
    ws.add_function("maths_", "f_");

    let found = resolve::find_function(&ws, &reference("maths", "f_"))
        .expect("no cycle")
        .expect("declaration");
    assert_eq!(found.module().as_str(), "maths");
}

#[test]
fn derivative_modules_get_no_sibling_of_their_own() {
    let mut ws = Workspace::new();
    ws.add_function("maths_", "h");
    ws.add_function("maths__", "h_");

    let found = resolve::find_function(&ws, &reference("maths_", "h_")).expect("no cycle");
    assert!(found.is_none());
}

#[test]
fn undiff_walks_down_to_the_real_base() {
    let mut ws = Workspace::new();
    ws.add_function("maths", "f");

    let under = resolve::undiff(&ws, &reference("maths", "f___"), &HashSet::new())
        .expect("no cycle")
        .expect("schedulable reference");
    assert_eq!(under, reference("maths", "f"));
}

#[test]
fn undiff_skips_orders_already_scheduled() {
    let mut ws = Workspace::new();
    ws.add_function("maths", "f");
    let scheduled: HashSet<Reference> = [reference("maths", "f__")].into_iter().collect();

    let under = resolve::undiff(&ws, &reference("maths", "f___"), &scheduled).expect("no cycle");
    assert!(under.is_none());
}

#[test]
fn undiff_reports_nothing_for_a_missing_base() {
    let ws = Workspace::new();
    let under = resolve::undiff(&ws, &reference("maths", "q_"), &HashSet::new()).expect("no cycle");
    assert!(under.is_none());
}

#[test]
fn unrealistic_derivative_chains_are_reported_as_cycles() {
    let ws = Workspace::new();
    let name = naming::derivative_name("f", naming::MAX_DERIVATIVE_ORDER + 1);

    let err = resolve::find_function(&ws, &reference("maths", &name)).unwrap_err();
    assert!(matches!(err, ResolveError::CycleDetected { .. }));

    let name = naming::derivative_name("f", naming::MAX_DERIVATIVE_ORDER + 8);
    let err = resolve::undiff(&ws, &reference("maths", &name), &HashSet::new()).unwrap_err();
    assert!(matches!(err, ResolveError::CycleDetected { .. }));
}

#[test]
fn placeholder_declarations_are_not_satisfied_dependencies() {
    let mut ws = Workspace::new();
    ws.add_function_stub("m", "speed");

    let instructions = [
        param("x"),
        ret(Expr::call("speed", vec![Expr::variable("x")])),
    ];
    let flow = FunctionFlow::parse(ModuleId::new("m"), "f", &instructions).expect("parse");
    // The stub cannot be scheduled either: its name carries no marker.
    let next = flow.next_to_diff(&ws, &HashSet::new()).expect("no cycle");
    assert!(next.is_none());
}

#[test]
fn first_schedulable_dependency_wins_in_document_order() {
    let mut ws = Workspace::new();
    ws.add_function("m", "p");
    ws.add_function("m", "q");

    let instructions = [
        param("x"),
        ret(Expr::add(
            Expr::call("p_", vec![Expr::variable("x")]),
            Expr::call("q_", vec![Expr::variable("x")]),
        )),
    ];
    let flow = FunctionFlow::parse(ModuleId::new("m"), "f", &instructions).expect("parse");

    let mut scheduled = HashSet::new();
    let next = flow.next_to_diff(&ws, &scheduled).expect("no cycle");
    assert_eq!(next, Some(reference("m", "p")));

    // With p in flight, the walk passes over it and surfaces q.
    scheduled.insert(reference("m", "p"));
    let next = flow.next_to_diff(&ws, &scheduled).expect("no cycle");
    assert_eq!(next, Some(reference("m", "q")));
}

#[test]
fn worklist_over_a_chain_terminates_after_n_minus_one_steps() {
    const N: usize = 4;

    let mut ws = Workspace::new();
    let mut flows: HashMap<String, FunctionFlow> = HashMap::new();
    for i in 0..N {
        let name = format!("f{}", i);
        ws.add_function("m", &name);
        let body = if i + 1 < N {
            ret(Expr::call(format!("f{}_", i + 1), vec![Expr::variable("x")]))
        } else {
            ret(Expr::mul(Expr::variable("x"), Expr::variable("x")))
        };
        let instructions = [param("x"), body];
        flows.insert(
            name.clone(),
            FunctionFlow::parse(ModuleId::new("m"), &name, &instructions).expect("parse"),
        );
    }

    fn drive(
        ws: &mut Workspace,
        flows: &HashMap<String, FunctionFlow>,
        name: &str,
        scheduled: &mut HashSet<Reference>,
        steps: &mut usize,
    ) {
        loop {
            let next = flows[name].next_to_diff(ws, scheduled).expect("no cycle");
            let Some(reference) = next else { break };
            *steps += 1;
            scheduled.insert(reference.clone());
            drive(ws, flows, &reference.name, scheduled, steps);
            // Simulated differentiation: the derivative lands in the
            // conventional sibling module.
            ws.add_function("m_", &naming::mark(&reference.name));
        }
    }

    let mut scheduled = HashSet::new();
    let mut steps = 0;
    drive(&mut ws, &flows, "f0", &mut scheduled, &mut steps);

    assert_eq!(steps, N - 1);
    let next = flows["f0"].next_to_diff(&ws, &scheduled).expect("no cycle");
    assert!(next.is_none());
}
