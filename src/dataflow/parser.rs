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

use crate::ast::Instruction;

use super::context::Context;
use super::flow::Flow;

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("statement is not part of the differentiable subset: {statement}")]
    Unsupported { statement: &'static str },
    #[error("declaration of '{name}' is missing an initializer")]
    MissingInitializer { name: String },
    #[error("parameter '{name}' declared after the first executable statement")]
    LateParameter { name: String },
    #[error("flow '{name}' is defined twice in the same scope")]
    Redefinition { name: String },
}

/// Builds the instruction context of a function body.
struct FlowParser {
    context: Context,
}

impl FlowParser {
    fn new() -> FlowParser {
        FlowParser {
            context: Context::new(),
        }
    }

    fn parse_instruction(&mut self, instruction: &Instruction) -> Result<(), SyntaxError> {
        match instruction {
            Instruction::Parameter { name, .. } => Err(SyntaxError::LateParameter {
                name: name.clone(),
            }),
            Instruction::Local { name, init: None } => Err(SyntaxError::MissingInitializer {
                name: name.clone(),
            }),
            Instruction::Local {
                name,
                init: Some(init),
            } => self.push(Flow::local(name.clone(), init.clone())),
            Instruction::Set { name, value } => self.push(Flow::set(name.clone(), value.clone())),
            Instruction::Return { value } => self.push(Flow::ret(value.clone())),
            Instruction::Print { .. } => Err(SyntaxError::Unsupported { statement: "print" }),
        }
    }

    fn push(&mut self, flow: Flow) -> Result<(), SyntaxError> {
        if self.context.get(flow.name()).is_some() {
            return Err(SyntaxError::Redefinition {
                name: flow.name().to_string(),
            });
        }
        self.context.push(flow);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Parameters,
    Body,
}

/// Two-state parser separating the parameter prefix from the executable
/// body. Parameters must form a contiguous declaration prefix; the first
/// non-parameter instruction flips the state irrevocably and is
/// re-dispatched to the body sub-parser.
pub struct FunctionParser {
    parameters: Context,
    body: FlowParser,
    state: ParseState,
}

impl FunctionParser {
    pub fn new() -> FunctionParser {
        FunctionParser {
            parameters: Context::new(),
            body: FlowParser::new(),
            state: ParseState::Parameters,
        }
    }

    pub fn parse_instructions(&mut self, instructions: &[Instruction]) -> Result<(), SyntaxError> {
        for instruction in instructions {
            self.parse_instruction(instruction)?;
        }
        Ok(())
    }

    fn parse_instruction(&mut self, instruction: &Instruction) -> Result<(), SyntaxError> {
        match self.state {
            ParseState::Body => self.body.parse_instruction(instruction),
            ParseState::Parameters => match instruction {
                Instruction::Parameter { name, default } => {
                    if self.parameters.get(name).is_some() {
                        return Err(SyntaxError::Redefinition { name: name.clone() });
                    }
                    self.parameters
                        .push(Flow::parameter(name.clone(), default.clone()));
                    Ok(())
                }
                other => {
                    self.state = ParseState::Body;
                    self.body.parse_instruction(other)
                }
            },
        }
    }

    /// The (parameters, instructions) contexts, unindexed.
    pub fn into_contexts(self) -> (Context, Context) {
        (self.parameters, self.body.context)
    }
}

impl Default for FunctionParser {
    fn default() -> Self {
        FunctionParser::new()
    }
}
