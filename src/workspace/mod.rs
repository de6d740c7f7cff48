// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0

//! In-memory project model backing the [`Resolver`] service.
//!
//! Hosts embed the engine behind their own project index; this table-backed
//! workspace serves standalone drivers and tests, and can be declared in a
//! TOML manifest. Names resolve in the scope module first, then in the
//! modules it runs (one level). Derivative modules are reached through the
//! naming convention, never through the run graph.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use crate::resolve::{Declaration, ModuleId, Resolver};

#[derive(Debug, Clone, Default)]
struct ModuleEntry {
    // name -> fully materialized (false = forward stub)
    functions: BTreeMap<String, bool>,
    variables: BTreeMap<String, bool>,
    runs: Vec<String>,
}

/// A table of modules with their declarations and run (import) edges.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    modules: BTreeMap<String, ModuleEntry>,
}

impl Workspace {
    pub fn new() -> Workspace {
        Workspace::default()
    }

    pub fn add_module(&mut self, module: &str) {
        self.modules.entry(module.to_string()).or_default();
    }

    /// Record that `module` runs `imported`, making its declarations
    /// visible from `module`.
    pub fn add_run(&mut self, module: &str, imported: &str) {
        self.entry(module).runs.push(imported.to_string());
    }

    pub fn add_function(&mut self, module: &str, function: &str) {
        self.entry(module).functions.insert(function.to_string(), true);
    }

    /// A forward stub: the name resolves but is not materialized yet.
    pub fn add_function_stub(&mut self, module: &str, function: &str) {
        self.entry(module).functions.insert(function.to_string(), false);
    }

    pub fn add_variable(&mut self, module: &str, variable: &str) {
        self.entry(module).variables.insert(variable.to_string(), true);
    }

    pub fn add_variable_stub(&mut self, module: &str, variable: &str) {
        self.entry(module).variables.insert(variable.to_string(), false);
    }

    fn entry(&mut self, module: &str) -> &mut ModuleEntry {
        self.modules.entry(module.to_string()).or_default()
    }

    /// The scope module followed by the modules it runs.
    fn scope<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a str> {
        std::iter::once(module).chain(
            self.modules
                .get(module)
                .into_iter()
                .flat_map(|entry| entry.runs.iter().map(String::as_str)),
        )
    }

    fn lookup(
        &self,
        module: &ModuleId,
        name: &str,
        table: impl Fn(&ModuleEntry) -> &BTreeMap<String, bool>,
    ) -> Option<Declaration> {
        for scope in self.scope(module.as_str()) {
            let Some(entry) = self.modules.get(scope) else {
                continue;
            };
            if let Some(&real) = table(entry).get(name) {
                let home = ModuleId::new(scope);
                return Some(if real {
                    Declaration::real(home, name)
                } else {
                    Declaration::stub(home, name)
                });
            }
        }
        None
    }
}

impl Resolver for Workspace {
    fn function(&self, module: &ModuleId, name: &str) -> Option<Declaration> {
        self.lookup(module, name, |entry| &entry.functions)
    }

    fn variable(&self, module: &ModuleId, name: &str) -> Option<Declaration> {
        self.lookup(module, name, |entry| &entry.variables)
    }

    fn module(&self, name: &str) -> Option<ModuleId> {
        self.modules.contains_key(name).then(|| ModuleId::new(name))
    }
}

/// Workspace manifest from a TOML document.
///
/// ```toml
/// [modules.physics]
/// variables = ["g"]
///
/// [modules.rocket]
/// functions = ["thrust"]
/// runs = ["physics"]
/// ```
#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceManifest {
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleManifest>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ModuleManifest {
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub function_stubs: Vec<String>,
    #[serde(default)]
    pub variable_stubs: Vec<String>,
    #[serde(default)]
    pub runs: Vec<String>,
}

impl WorkspaceManifest {
    pub fn from_toml(text: &str) -> Result<WorkspaceManifest> {
        Ok(toml::from_str(text)?)
    }

    pub fn build(&self) -> Workspace {
        let mut workspace = Workspace::new();
        for (name, module) in &self.modules {
            workspace.add_module(name);
            for function in &module.functions {
                workspace.add_function(name, function);
            }
            for function in &module.function_stubs {
                workspace.add_function_stub(name, function);
            }
            for variable in &module.variables {
                workspace.add_variable(name, variable);
            }
            for variable in &module.variable_stubs {
                workspace.add_variable_stub(name, variable);
            }
            for run in &module.runs {
                workspace.add_run(name, run);
            }
        }
        workspace
    }
}
