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

// Part of the TANGENT project (symbolic derivative generation for mission scripts).

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;

use crate::ast::Instruction;
use crate::expr::{Expr, Step};
use crate::resolve::{self, naming, Declaration, ModuleId, Reference, ResolveError, Resolver};

use super::context::Context;
use super::flow::ImportFlow;
use super::parser::{FunctionParser, SyntaxError};

/// A function as a pair of dataflow contexts: the declared parameters and
/// the instruction body. The body's parent context is the parameter
/// context, so body definitions can reference parameters by name.
#[derive(Debug)]
pub struct FunctionFlow {
    module: ModuleId,
    name: String,
    parameters: Rc<Context>,
    instructions: Context,
}

impl FunctionFlow {
    /// Build a FunctionFlow from an already-parsed instruction list.
    ///
    /// A function without a terminating return instruction is accepted;
    /// callers relying on the return flow must check for it themselves.
    pub fn parse(
        module: ModuleId,
        name: impl Into<String>,
        instructions: &[Instruction],
    ) -> Result<FunctionFlow, SyntaxError> {
        let mut parser = FunctionParser::new();
        parser.parse_instructions(instructions)?;
        let (mut parameters, mut body) = parser.into_contexts();
        parameters.build_map();
        let parameters = Rc::new(parameters);
        body.set_parent(Rc::clone(&parameters));
        body.build_map();
        Ok(FunctionFlow {
            module,
            name: name.into(),
            parameters,
            instructions: body,
        })
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &Context {
        &self.parameters
    }

    pub fn instructions(&self) -> &Context {
        &self.instructions
    }

    /// Produce the tangent function. Never mutates `self`.
    ///
    /// Differentiation assumes a single independent variable: every
    /// parameter maps to its marker twin and tangent call sites pass
    /// tangent arguments positionally. Partial derivatives of
    /// multi-parameter functions are out of scope.
    pub fn differentiate(&self) -> FunctionFlow {
        let mut parameters = Context::new();
        self.parameters.differentiate(&mut parameters);
        parameters.build_map();
        parameters.simplify();
        let parameters = Rc::new(parameters);

        let mut flows = Context::with_parent(Rc::clone(&parameters));
        self.instructions.differentiate(&mut flows);
        flows.build_map();
        // The signature itself consumes the tangent's return value; keep it
        // alive through simplification even when nothing local reads it.
        if let Some(ret) = flows.return_flow_mut() {
            ret.add_function_dependee();
        }
        flows.simplify();

        FunctionFlow {
            module: self.module.clone(),
            name: naming::mark(&self.name),
            parameters,
            instructions: flows,
        }
    }

    /// Source-form render of the function. Layout is load-bearing for the
    /// host's diffing, down to the blank line after a non-empty parameter
    /// block.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Walk all definition expressions, parameters first, then the body.
    fn visit_expressions<T>(
        &self,
        visit: &mut impl FnMut(&Expr) -> ControlFlow<T, Step>,
    ) -> ControlFlow<T, ()> {
        for flow in self.parameters.flows().iter().chain(self.instructions.flows()) {
            if let Some(definition) = flow.definition() {
                definition.walk(visit)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Resolve a function name from this function's module, following the
    /// sibling-module convention for derivatives.
    pub fn find_function(
        &self,
        resolver: &impl Resolver,
        name: &str,
    ) -> Result<Option<Declaration>, ResolveError> {
        resolve::find_function(resolver, &Reference::new(self.module.clone(), name))
    }

    /// Find the next function that must be differentiated before this
    /// function's own derivative can be completed.
    ///
    /// Call sites are visited in document order. A call that resolves to a
    /// real declaration is satisfied and scanning continues into its
    /// arguments. An unsatisfied call is walked down by
    /// [`resolve::undiff`]: the first one yielding a schedulable reference
    /// aborts the walk; one yielding nothing (its base order is already
    /// scheduled this cycle, or truly missing upstream) is skipped whole.
    pub fn next_to_diff(
        &self,
        resolver: &impl Resolver,
        scheduled: &HashSet<Reference>,
    ) -> Result<Option<Reference>, ResolveError> {
        let outcome = self.visit_expressions(&mut |expr| {
            let Expr::Call { name, .. } = expr else {
                return ControlFlow::Continue(Step::Into);
            };
            let reference = Reference::new(self.module.clone(), name.clone());
            let declaration = match resolve::find_function(resolver, &reference) {
                Ok(declaration) => declaration,
                Err(error) => return ControlFlow::Break(Err(error)),
            };
            match declaration {
                Some(declaration) if declaration.is_real() => ControlFlow::Continue(Step::Into),
                _ => match resolve::undiff(resolver, &reference, scheduled) {
                    Ok(Some(under)) => ControlFlow::Break(Ok(under)),
                    Ok(None) => ControlFlow::Continue(Step::Over),
                    Err(error) => ControlFlow::Break(Err(error)),
                },
            }
        });
        match outcome {
            ControlFlow::Break(Ok(reference)) => Ok(Some(reference)),
            ControlFlow::Break(Err(error)) => Err(error),
            ControlFlow::Continue(()) => Ok(None),
        }
    }

    /// Modules the generated text must additionally import when inserted
    /// into `target`.
    ///
    /// Function calls are resolved through [`resolve::find_function`].
    /// Variables are resolved on their first occurrence only: later
    /// occurrences of a name already seen in this walk are assumed in
    /// scope (a local reassignment). This can under-import a name that is
    /// legitimately external on a later occurrence after being locally
    /// shadowed earlier.
    pub fn imports(
        &self,
        resolver: &impl Resolver,
        target: &ModuleId,
    ) -> Result<BTreeSet<ImportFlow>, ResolveError> {
        let mut imports = BTreeSet::new();
        let mut seen: HashSet<String> = HashSet::new();
        let outcome = self.visit_expressions(&mut |expr| {
            match expr {
                Expr::Call { name, .. } => {
                    let reference = Reference::new(self.module.clone(), name.clone());
                    match resolve::find_function(resolver, &reference) {
                        Ok(resolved) => add_import(&mut imports, resolved, target),
                        Err(error) => return ControlFlow::Break(error),
                    }
                }
                Expr::Variable(name) => {
                    if seen.insert(name.clone()) {
                        add_import(&mut imports, resolver.variable(&self.module, name), target);
                    }
                }
                _ => {}
            }
            ControlFlow::Continue(Step::Into)
        });
        match outcome {
            ControlFlow::Break(error) => Err(error),
            ControlFlow::Continue(()) => Ok(imports),
        }
    }
}

fn add_import(
    imports: &mut BTreeSet<ImportFlow>,
    resolved: Option<Declaration>,
    target: &ModuleId,
) {
    if let Some(declaration) = resolved {
        if declaration.is_real() && declaration.module() != target {
            imports.insert(ImportFlow::new(declaration.module().clone()));
        }
    }
}

impl fmt::Display for FunctionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function {} {{", self.name)?;
        writeln!(f, "{}", self.parameters)?;
        if !self.parameters.is_empty() {
            writeln!(f)?;
        }
        writeln!(f, "{}", self.instructions)?;
        write!(f, "}}")
    }
}
