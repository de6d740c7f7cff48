use tangent::ast::Instruction;
use tangent::dataflow::{FlowKind, FunctionFlow, SyntaxError};
use tangent::expr::Expr;
use tangent::resolve::ModuleId;

fn module() -> ModuleId {
    ModuleId::new("rocket")
}

fn param(name: &str) -> Instruction {
    Instruction::Parameter {
        name: name.to_string(),
        default: None,
    }
}

fn set(name: &str, value: Expr) -> Instruction {
    Instruction::Set {
        name: name.to_string(),
        value,
    }
}

fn ret(value: Expr) -> Instruction {
    Instruction::Return { value }
}

#[test]
fn splits_parameter_prefix_from_body() {
    for k in [0usize, 1, 3] {
        let names = ["a", "b", "c"];
        let mut instructions: Vec<Instruction> =
            names[..k].iter().map(|name| param(name)).collect();
        instructions.push(set("x", Expr::number(1.0)));
        instructions.push(ret(Expr::variable("x")));

        let flow = FunctionFlow::parse(module(), "f", &instructions).expect("parse");
        assert_eq!(flow.parameters().len(), k, "parameter count for K={}", k);
        assert_eq!(flow.instructions().len(), 2, "body count for K={}", k);
        assert!(flow
            .parameters()
            .flows()
            .iter()
            .all(|f| f.kind() == FlowKind::Parameter));
    }
}

#[test]
fn first_body_instruction_ends_parameters_for_good() {
    let instructions = [
        param("a"),
        set("x", Expr::variable("a")),
        param("b"),
    ];
    let err = FunctionFlow::parse(module(), "f", &instructions).unwrap_err();
    assert!(matches!(err, SyntaxError::LateParameter { ref name } if name == "b"));
}

#[test]
fn local_declaration_flips_state_and_is_kept() {
    let instructions = [
        param("a"),
        Instruction::Local {
            name: "x".to_string(),
            init: Some(Expr::variable("a")),
        },
        ret(Expr::variable("x")),
    ];
    let flow = FunctionFlow::parse(module(), "f", &instructions).expect("parse");
    assert_eq!(flow.parameters().len(), 1);
    assert_eq!(flow.instructions().len(), 2);
    assert_eq!(flow.instructions().flows()[0].kind(), FlowKind::Local);
}

#[test]
fn declaration_without_initializer_is_rejected() {
    let instructions = [Instruction::Local {
        name: "x".to_string(),
        init: None,
    }];
    let err = FunctionFlow::parse(module(), "f", &instructions).unwrap_err();
    assert!(matches!(err, SyntaxError::MissingInitializer { ref name } if name == "x"));
}

#[test]
fn statement_outside_subset_is_rejected() {
    let instructions = [Instruction::Print {
        value: Expr::variable("x"),
    }];
    let err = FunctionFlow::parse(module(), "f", &instructions).unwrap_err();
    assert!(format!("{}", err).contains("print"));
}

#[test]
fn duplicate_flow_name_is_rejected() {
    let instructions = [
        set("x", Expr::number(1.0)),
        set("x", Expr::number(2.0)),
    ];
    let err = FunctionFlow::parse(module(), "f", &instructions).unwrap_err();
    assert!(matches!(err, SyntaxError::Redefinition { ref name } if name == "x"));

    let instructions = [
        ret(Expr::number(1.0)),
        ret(Expr::number(2.0)),
    ];
    let err = FunctionFlow::parse(module(), "f", &instructions).unwrap_err();
    assert!(matches!(err, SyntaxError::Redefinition { .. }));
}

#[test]
fn missing_return_is_accepted() {
    let instructions = [param("mass"), set("result", Expr::variable("mass"))];
    let flow = FunctionFlow::parse(module(), "thrust", &instructions).expect("parse");
    assert!(flow.instructions().return_flow().is_none());
}
