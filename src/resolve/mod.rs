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

//! Cross-module name resolution.
//!
//! The engine never owns a project model; the host supplies one through the
//! [`Resolver`] trait. On top of that service, [`find_function`] and
//! [`undiff`] implement the naming-convention-driven lookup that lets a
//! driver discover the derivative-dependency closure one missing
//! predecessor at a time.

use std::collections::HashSet;
use std::fmt;

pub mod naming;

/// Identity of a module (a source file, in the host's terms).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(name: impl Into<String>) -> ModuleId {
        ModuleId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (scope, name) pair identifying a callable or variable before
/// resolution. The module is the scope the name was seen in, not
/// necessarily where the declaration lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub module: ModuleId,
    pub name: String,
}

impl Reference {
    pub fn new(module: ModuleId, name: impl Into<String>) -> Reference {
        Reference {
            module,
            name: name.into(),
        }
    }
}

/// A resolved declaration. `real` distinguishes a fully materialized
/// declaration from a placeholder/forward stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    module: ModuleId,
    name: String,
    real: bool,
}

impl Declaration {
    pub fn real(module: ModuleId, name: impl Into<String>) -> Declaration {
        Declaration {
            module,
            name: name.into(),
            real: true,
        }
    }

    pub fn stub(module: ModuleId, name: impl Into<String>) -> Declaration {
        Declaration {
            module,
            name: name.into(),
            real: false,
        }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_real(&self) -> bool {
        self.real
    }
}

/// The name-resolution service supplied by the host.
///
/// Functions resolve within the named module only; variables share one
/// project-wide namespace, so a variable lookup may land in another module.
/// An unresolved name is `None`, never an error.
pub trait Resolver {
    fn function(&self, module: &ModuleId, name: &str) -> Option<Declaration>;

    fn variable(&self, module: &ModuleId, name: &str) -> Option<Declaration>;

    /// Look up a module by name (for the sibling-module convention).
    fn module(&self, name: &str) -> Option<ModuleId>;
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The derivative chain behind `name` is deeper than any realistic
    /// differentiation order; conventionally-named modules most likely
    /// reference each other in a loop.
    #[error("derivative chain for '{name}' exceeds {max} orders; resolution aborted")]
    CycleDetected { name: String, max: usize },
}

fn cycle(name: &str) -> ResolveError {
    ResolveError::CycleDetected {
        name: name.to_string(),
        max: naming::MAX_DERIVATIVE_ORDER,
    }
}

/// Resolve a function reference, falling back to the naming convention:
/// the derivative of a function `f` defined in module `m`, when not
/// colocated with `f`, is expected in a sibling module `m_` under the
/// marker-suffixed name.
pub fn find_function(
    resolver: &impl Resolver,
    reference: &Reference,
) -> Result<Option<Declaration>, ResolveError> {
    if let Some(found) = resolver.function(&reference.module, &reference.name) {
        return Ok(Some(found));
    }
    let order = naming::order(&reference.name);
    if order == 0 {
        return Ok(None);
    }
    if order > naming::MAX_DERIVATIVE_ORDER {
        return Err(cycle(&reference.name));
    }
    let base = naming::base(&reference.name);
    let Some(original) = resolver.function(&reference.module, base) else {
        return Ok(None);
    };
    let home = original.module();
    if naming::order(home.as_str()) > 0 {
        // Derivative modules are not given derivative modules of their own.
        return Ok(None);
    }
    let Some(sibling) = resolver.module(&naming::mark(home.as_str())) else {
        return Ok(None);
    };
    Ok(resolver.function(&sibling, &reference.name))
}

/// Walk a marker-suffixed reference down to the lower-order function that
/// must be differentiated before it can resolve.
///
/// Returns `None` when the stripped name is already scheduled this cycle
/// (its derivative is being produced), or when the marker is exhausted
/// without reaching a real declaration (an unrecoverable gap upstream).
pub fn undiff(
    resolver: &impl Resolver,
    reference: &Reference,
    scheduled: &HashSet<Reference>,
) -> Result<Option<Reference>, ResolveError> {
    let mut name = reference.name.as_str();
    let mut depth = 0;
    while let Some(stripped) = naming::strip_one(name) {
        depth += 1;
        if depth > naming::MAX_DERIVATIVE_ORDER {
            return Err(cycle(&reference.name));
        }
        let under = Reference::new(reference.module.clone(), stripped);
        if scheduled.contains(&under) {
            return Ok(None);
        }
        match find_function(resolver, &under)? {
            Some(declaration) if declaration.is_real() => return Ok(Some(under)),
            _ => name = stripped,
        }
    }
    Ok(None)
}
