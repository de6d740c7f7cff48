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

use std::collections::BTreeSet;
use std::fmt;

use crate::expr::{diff, simplify, Expr};
use crate::resolve::{naming, ModuleId};

/// Reserved name of the flow carrying a function's return value.
pub const RETURN_FLOW: &str = "return";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Parameter,
    Local,
    Set,
    Return,
}

/// A single named computation within one scope level.
///
/// Dependees are reverse edges: the names of flows in the same context
/// whose definitions consume this one. The function-dependee flag records
/// consumption from outside the context; the owning function's signature
/// consumes the return flow even when nothing local does.
#[derive(Debug, Clone)]
pub struct Flow {
    name: String,
    kind: FlowKind,
    definition: Option<Expr>,
    dependees: BTreeSet<String>,
    function_dependee: bool,
}

impl Flow {
    fn new(name: impl Into<String>, kind: FlowKind, definition: Option<Expr>) -> Flow {
        Flow {
            name: name.into(),
            kind,
            definition,
            dependees: BTreeSet::new(),
            function_dependee: false,
        }
    }

    pub fn parameter(name: impl Into<String>, default: Option<Expr>) -> Flow {
        Flow::new(name, FlowKind::Parameter, default)
    }

    pub fn local(name: impl Into<String>, init: Expr) -> Flow {
        Flow::new(name, FlowKind::Local, Some(init))
    }

    pub fn set(name: impl Into<String>, value: Expr) -> Flow {
        Flow::new(name, FlowKind::Set, Some(value))
    }

    pub fn ret(value: Expr) -> Flow {
        Flow::new(RETURN_FLOW, FlowKind::Return, Some(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn definition(&self) -> Option<&Expr> {
        self.definition.as_ref()
    }

    pub(crate) fn set_definition(&mut self, definition: Expr) {
        self.definition = Some(definition);
    }

    pub fn dependees(&self) -> &BTreeSet<String> {
        &self.dependees
    }

    pub fn add_dependee(&mut self, name: &str) {
        self.dependees.insert(name.to_string());
    }

    pub(crate) fn clear_dependees(&mut self) {
        self.dependees.clear();
    }

    /// Record that the owning function itself consumes this flow.
    pub fn add_function_dependee(&mut self) {
        self.function_dependee = true;
    }

    pub fn has_function_dependee(&self) -> bool {
        self.function_dependee
    }

    /// Whether simplification may remove this flow once nothing consumes
    /// it. `set` targets mutate enclosing state and parameters are part of
    /// the signature; only scoped flows are provably dead.
    pub(crate) fn prunable(&self) -> bool {
        if self.function_dependee {
            return false;
        }
        matches!(self.kind, FlowKind::Local | FlowKind::Return)
    }

    /// Tangent counterpart of this flow. Value flows map to their marker
    /// twin; the return flow keeps its reserved name.
    pub fn differentiate(&self, active: &dyn Fn(&str) -> bool) -> Flow {
        let name = match self.kind {
            FlowKind::Return => RETURN_FLOW.to_string(),
            _ => naming::mark(&self.name),
        };
        let definition = self
            .definition
            .as_ref()
            .map(|definition| diff::tangent(definition, active));
        Flow::new(name, self.kind, definition)
    }

    pub(crate) fn simplify(&mut self) {
        if let Some(definition) = self.definition.take() {
            self.definition = Some(simplify::simplify(&definition));
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.definition) {
            (FlowKind::Parameter, None) => write!(f, "parameter {}.", self.name),
            (FlowKind::Parameter, Some(default)) => {
                write!(f, "parameter {} is {}.", self.name, default)
            }
            (FlowKind::Local, Some(init)) => write!(f, "local {} is {}.", self.name, init),
            (FlowKind::Set, Some(value)) => write!(f, "set {} to {}.", self.name, value),
            (FlowKind::Return, Some(value)) => write!(f, "return {}.", value),
            // Only parameters are created without a definition.
            (_, None) => Ok(()),
        }
    }
}

/// An external module a generated function depends on. Deduplicated by
/// module identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportFlow {
    module: ModuleId,
}

impl ImportFlow {
    pub fn new(module: ModuleId) -> ImportFlow {
        ImportFlow { module }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }
}

impl fmt::Display for ImportFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run once {}.", self.module)
    }
}
