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

//! Dataflow core of the derivative generator.
//!
//! A function is parsed into two [`Context`]s (the declared parameters
//! and the instruction body), and [`FunctionFlow::differentiate`] derives
//! the tangent function from them. The transformation is pure: it consumes
//! an instruction list the host already parsed and produces a new
//! [`FunctionFlow`] that renders back to source form. Cross-module
//! dependencies of the tangent are discovered on demand through
//! [`FunctionFlow::next_to_diff`] and [`FunctionFlow::imports`]; the host
//! drives the loop and owns all editor concerns.

mod context;
mod flow;
mod function;
mod parser;

pub use context::Context;
pub use flow::{Flow, FlowKind, ImportFlow, RETURN_FLOW};
pub use function::FunctionFlow;
pub use parser::{FunctionParser, SyntaxError};
