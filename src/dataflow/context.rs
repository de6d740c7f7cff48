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

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;

use crate::expr::{Expr, Step};

use super::flow::{Flow, FlowKind};

/// An ordered collection of flows forming one scope level.
///
/// The name index is built by an explicit [`build_map`](Context::build_map)
/// step once all entries are inserted; entries must not be added
/// afterwards. An optional parent context chains scopes: lookup checks the
/// local index, else delegates to the parent.
#[derive(Debug, Default)]
pub struct Context {
    flows: Vec<Flow>,
    index: Option<HashMap<String, usize>>,
    parent: Option<Rc<Context>>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    pub fn with_parent(parent: Rc<Context>) -> Context {
        Context {
            parent: Some(parent),
            ..Context::default()
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Rc<Context>) {
        self.parent = Some(parent);
    }

    pub fn parent(&self) -> Option<&Rc<Context>> {
        self.parent.as_ref()
    }

    pub fn push(&mut self, flow: Flow) {
        assert!(
            self.index.is_none(),
            "context is already indexed; entries must not be added after build_map"
        );
        self.flows.push(flow);
    }

    /// Build the name index and wire dependee edges between local flows.
    pub fn build_map(&mut self) {
        self.build_index();
        self.rewire();
    }

    fn build_index(&mut self) {
        let mut index = HashMap::with_capacity(self.flows.len());
        for (i, flow) in self.flows.iter().enumerate() {
            index.insert(flow.name().to_string(), i);
        }
        self.index = Some(index);
    }

    /// Recompute dependee edges from flow definitions. Only flows of this
    /// context are wired; edges into the parent are not tracked.
    fn rewire(&mut self) {
        for flow in &mut self.flows {
            flow.clear_dependees();
        }
        let edges: Vec<(String, Vec<String>)> = self
            .flows
            .iter()
            .map(|flow| {
                let referenced = flow.definition().map(referenced_names).unwrap_or_default();
                (flow.name().to_string(), referenced)
            })
            .collect();
        for (dependee, referenced) in edges {
            for name in referenced {
                if let Some(flow) = self.flows.iter_mut().find(|f| f.name() == name) {
                    flow.add_dependee(&dependee);
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Flow> {
        let local = match &self.index {
            Some(index) => index.get(name).map(|&i| &self.flows[i]),
            None => self.flows.iter().find(|f| f.name() == name),
        };
        local.or_else(|| self.parent.as_ref().and_then(|parent| parent.get(name)))
    }

    /// Whether `name` resolves in this context or any enclosing one.
    pub fn resolves(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// The flow carrying the function's return value, if the body has one.
    /// Parsing accepts functions without it; callers that need it check here.
    pub fn return_flow(&self) -> Option<&Flow> {
        self.flows
            .iter()
            .find(|flow| flow.kind() == FlowKind::Return)
    }

    pub fn return_flow_mut(&mut self) -> Option<&mut Flow> {
        self.flows
            .iter_mut()
            .find(|flow| flow.kind() == FlowKind::Return)
    }

    /// Produce tangent flows into a caller-supplied target, in order. A
    /// variable is active when it resolves in this context's scope chain.
    pub fn differentiate(&self, target: &mut Context) {
        for flow in &self.flows {
            target.push(flow.differentiate(&|name: &str| self.resolves(name)));
        }
    }

    /// In-place algebraic reduction of this context's entries: per-flow
    /// simplification, common-subexpression elimination across the local
    /// entries, and removal of flows nothing consumes.
    pub fn simplify(&mut self) {
        for flow in &mut self.flows {
            flow.simplify();
        }
        self.eliminate_common_subexpressions();
        // Removing a dead flow can orphan the flows it consumed.
        loop {
            self.rewire();
            let dead: HashSet<String> = self
                .flows
                .iter()
                .filter(|flow| flow.prunable() && flow.dependees().is_empty())
                .map(|flow| flow.name().to_string())
                .collect();
            if dead.is_empty() {
                break;
            }
            self.flows.retain(|flow| !dead.contains(flow.name()));
        }
        if self.index.is_some() {
            self.build_index();
        }
    }

    /// Replace a definition that repeats an earlier entry's definition with
    /// a reference to that entry. Operates on this context's entries only.
    fn eliminate_common_subexpressions(&mut self) {
        for i in 1..self.flows.len() {
            if !matches!(self.flows[i].kind(), FlowKind::Local | FlowKind::Set) {
                continue;
            }
            let Some(definition) = self.flows[i].definition().cloned() else {
                continue;
            };
            if matches!(definition, Expr::Number(_) | Expr::Variable(_)) {
                continue;
            }
            let earlier = self.flows[..i].iter().find(|flow| {
                matches!(flow.kind(), FlowKind::Local | FlowKind::Set)
                    && flow.definition() == Some(&definition)
            });
            if let Some(earlier) = earlier {
                let name = earlier.name().to_string();
                self.flows[i].set_definition(Expr::variable(name));
            }
        }
    }
}

fn referenced_names(expr: &Expr) -> Vec<String> {
    let mut names = Vec::new();
    let _: ControlFlow<()> = expr.walk(&mut |node| {
        if let Expr::Variable(name) = node {
            names.push(name.clone());
        }
        ControlFlow::Continue(Step::Into)
    });
    names
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flow) in self.flows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", flow)?;
        }
        Ok(())
    }
}
