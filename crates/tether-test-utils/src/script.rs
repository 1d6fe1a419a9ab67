//! Assignment-only script compiler for tests.
//!
//! Grammar:
//!
//! ```text
//! stmt   := name '=' value
//!         | name '.setRegion(' int ',' value ')'
//!         | 'pause' | 'run(' int ')'
//! value  := number | '(' number (',' number)* ')'
//! ```

use std::collections::HashMap;

use smallvec::SmallVec;
use tether_core::{
    CompileError, Compiler, Executable, ParamValue, RegionId, RegionSelection, ScriptError,
};

use crate::solver::MockSolver;

/// Compiles assignments to the parameters it was told about.
#[derive(Debug, Clone, Default)]
pub struct AssignCompiler {
    params: HashMap<String, usize>,
}

impl AssignCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an assignable parameter with `n_comp` components.
    pub fn with_param(mut self, name: &str, n_comp: usize) -> Self {
        self.params.insert(name.to_owned(), n_comp);
        self
    }
}

/// A compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Assign {
    Set {
        target: String,
        region: RegionSelection,
        value: ParamValue,
    },
    Pause,
    Run(u64),
}

impl Executable<MockSolver> for Assign {
    fn format(&self) -> String {
        match self {
            Assign::Set {
                target,
                region: RegionSelection::All,
                value,
            } => format!("{target} = {}", format_value(value)),
            Assign::Set {
                target,
                region: RegionSelection::One(r),
                value,
            } => format!("{target}.setRegion({r}, {})", format_value(value)),
            Assign::Pause => "pause".to_owned(),
            Assign::Run(n) => format!("run({n})"),
        }
    }

    fn eval(&self, sim: &mut MockSolver) -> Result<(), ScriptError> {
        match self {
            Assign::Set {
                target,
                region,
                value,
            } => sim.set_param(target, *region, value),
            Assign::Pause => {
                sim.paused = true;
                Ok(())
            }
            Assign::Run(n) => {
                sim.paused = false;
                sim.run_for = Some(*n);
                Ok(())
            }
        }
    }
}

fn format_value(value: &[f64]) -> String {
    match value {
        [v] => v.to_string(),
        vs => {
            let parts: Vec<String> = vs.iter().map(f64::to_string).collect();
            format!("({})", parts.join(", "))
        }
    }
}

impl Compiler<MockSolver> for AssignCompiler {
    fn compile(&self, text: &str) -> Result<Box<dyn Executable<MockSolver>>, CompileError> {
        let mut p = Parser::new(text);
        let stmt = self.statement(&mut p)?;
        p.skip_ws();
        if !p.at_end() {
            return Err(p.error("unexpected trailing input"));
        }
        Ok(Box::new(stmt))
    }
}

impl AssignCompiler {
    fn statement(&self, p: &mut Parser<'_>) -> Result<Assign, CompileError> {
        let name = p.ident()?;
        match name {
            "pause" if p.rest().trim().is_empty() => return Ok(Assign::Pause),
            "run" => {
                p.expect('(')?;
                let n = p.integer()?;
                p.expect(')')?;
                let steps = u64::try_from(n).map_err(|_| p.error("step count must be >= 0"))?;
                return Ok(Assign::Run(steps));
            }
            _ => {}
        }

        let expected = *self.params.get(name).ok_or_else(|| CompileError::Undefined {
            name: name.to_owned(),
        })?;

        p.skip_ws();
        let (region, value) = if p.eat('.') {
            let method = p.ident()?;
            if method != "setRegion" {
                return Err(CompileError::Undefined {
                    name: format!("{name}.{method}"),
                });
            }
            p.expect('(')?;
            let r = p.integer()?;
            let region = u8::try_from(r)
                .map(|r| RegionSelection::One(RegionId(r)))
                .map_err(|_| p.error("region must be in 0..=255"))?;
            p.expect(',')?;
            let value = p.value()?;
            p.expect(')')?;
            (region, value)
        } else {
            p.expect('=')?;
            (RegionSelection::All, p.value()?)
        };

        if value.len() != expected {
            return Err(CompileError::Arity {
                name: name.to_owned(),
                expected,
                found: value.len(),
            });
        }
        Ok(Assign::Set {
            target: name.to_owned(),
            region,
            value,
        })
    }
}

/// Byte-offset cursor over the statement text.
struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn error(&self, message: &str) -> CompileError {
        CompileError::Syntax {
            position: self.pos,
            message: message.to_owned(),
        }
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), CompileError> {
        if self.eat(c) {
            Ok(())
        } else if self.at_end() {
            Err(self.error(&format!("expected '{c}', found end of input")))
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !f(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn ident(&mut self) -> Result<&'a str, CompileError> {
        self.skip_ws();
        if !self.rest().starts_with(|c: char| c.is_alphabetic() || c == '_') {
            return Err(self.error("expected identifier"));
        }
        Ok(self.take_while(|c| c.is_alphanumeric() || c == '_'))
    }

    fn number(&mut self) -> Result<f64, CompileError> {
        self.skip_ws();
        let start = self.pos;
        let lexeme =
            self.take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
        lexeme.parse().map_err(|_| {
            self.pos = start;
            if lexeme.is_empty() && self.at_end() {
                self.error("expected number, found end of input")
            } else {
                self.error("expected number")
            }
        })
    }

    fn integer(&mut self) -> Result<i64, CompileError> {
        self.skip_ws();
        let start = self.pos;
        let lexeme = self.take_while(|c| c.is_ascii_digit() || c == '-');
        lexeme.parse().map_err(|_| {
            self.pos = start;
            self.error("expected integer")
        })
    }

    fn value(&mut self) -> Result<ParamValue, CompileError> {
        if !self.eat('(') {
            return Ok(SmallVec::from_elem(self.number()?, 1));
        }
        let mut out = ParamValue::new();
        out.push(self.number()?);
        while self.eat(',') {
            out.push(self.number()?);
        }
        self.expect(')')?;
        Ok(out)
    }
}
