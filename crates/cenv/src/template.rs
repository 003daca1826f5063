// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Restricted text-template language for command values.
//!
//! Supports literal text with `{{ ... }}` actions. An action is a pipeline:
//! a string literal, a dotted data reference, or a function call, optionally
//! piped through further function calls (`{{ "FOO" | env }}`). The function
//! namespace is fixed: a small baseline (`upper`, `lower`, `trim`) plus the
//! two container-bound functions `env` and `expandenv`.
//!
//! Parse failures (bad syntax, unknown functions, unterminated actions) and
//! execution failures (missing or non-scalar data keys) are distinct error
//! kinds. The handler is not shareable across threads; it is reused freely
//! within a single load.

use std::collections::HashMap;

use serde_json::Value;

use crate::container::Container;
use crate::error::{Error, Result};

#[cfg(test)]
#[path = "./template_test.rs"]
mod template_test;

/// Expands templates against a data map and the variable container.
#[derive(Debug, Default)]
pub(crate) struct TemplateHandler {
    data: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Env,
    ExpandEnv,
    Upper,
    Lower,
    Trim,
}

impl Func {
    fn resolve(name: &str) -> Option<Self> {
        match name {
            "env" => Some(Func::Env),
            "expandenv" => Some(Func::ExpandEnv),
            "upper" => Some(Func::Upper),
            "lower" => Some(Func::Lower),
            "trim" => Some(Func::Trim),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Node {
    Text(String),
    Action(Pipeline),
}

/// One `{{ ... }}` action: a head expression piped through function calls.
#[derive(Debug)]
struct Pipeline {
    head: Expr,
    calls: Vec<(Func, Vec<Expr>)>,
}

#[derive(Debug)]
enum Expr {
    Literal(String),
    DataRef(Vec<String>),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, PartialEq)]
enum Token {
    Ident(String),
    Literal(String),
    DataRef(Vec<String>),
    Pipe,
}

impl TemplateHandler {
    pub fn new(data: HashMap<String, Value>) -> Self {
        Self { data }
    }

    /// Expand `input`, reading variables through `container`.
    pub fn handle(&self, input: &str, container: &Container) -> Result<String> {
        let nodes = parse(input)?;

        let mut out = String::with_capacity(input.len());

        for node in &nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => out.push_str(&self.eval_pipeline(pipeline, container)?),
            }
        }

        Ok(out)
    }

    fn eval_pipeline(&self, pipeline: &Pipeline, container: &Container) -> Result<String> {
        let mut value = self.eval_expr(&pipeline.head, container)?;

        for (func, args) in &pipeline.calls {
            let mut values = Vec::with_capacity(args.len() + 1);

            for arg in args {
                values.push(self.eval_expr(arg, container)?);
            }

            values.push(value);
            value = apply(*func, &values, container);
        }

        Ok(value)
    }

    fn eval_expr(&self, expr: &Expr, container: &Container) -> Result<String> {
        match expr {
            Expr::Literal(s) => Ok(s.clone()),
            Expr::DataRef(segments) => self.eval_data_ref(segments),
            Expr::Call(func, args) => {
                let mut values = Vec::with_capacity(args.len());

                for arg in args {
                    values.push(self.eval_expr(arg, container)?);
                }

                Ok(apply(*func, &values, container))
            }
        }
    }

    fn eval_data_ref(&self, segments: &[String]) -> Result<String> {
        let mut current = self.data.get(&segments[0]).ok_or_else(|| Error::Execution {
            detail: format!("Unknown data key {:?}", segments[0]),
        })?;

        for segment in &segments[1..] {
            current = current.get(segment).ok_or_else(|| Error::Execution {
                detail: format!("Unknown data key {segment:?}"),
            })?;
        }

        match current {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(Error::Execution {
                detail: format!("Data key {:?} is not a scalar", segments.join(".")),
            }),
        }
    }
}

fn apply(func: Func, args: &[String], container: &Container) -> String {
    // Arity was checked at parse time; the last argument is the piped value.
    let arg = args.last().map(String::as_str).unwrap_or("");

    match func {
        Func::Env => container.lookup(arg),
        Func::ExpandEnv => expand_vars(arg, |name| container.lookup(name)),
        Func::Upper => arg.to_uppercase(),
        Func::Lower => arg.to_lowercase(),
        Func::Trim => arg.trim().to_string(),
    }
}

/// Replace `$NAME` and `${NAME}` occurrences using `lookup`.
///
/// Names are `[A-Za-z_][A-Za-z0-9_]*`; a `$` not introducing a name is kept
/// literally.
pub fn expand_vars(input: &str, lookup: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek() {
            Some(&(_, '{')) => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;

                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }

                if closed && !name.is_empty() {
                    out.push_str(&lookup(&name));
                } else {
                    // Unterminated or empty reference stays literal.
                    out.push_str("${");
                    out.push_str(&name);
                    if closed {
                        out.push('}');
                    }
                }
            }
            Some(&(_, c)) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();

                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }

                out.push_str(&lookup(&name));
            }
            _ => out.push('$'),
        }
    }

    out
}

fn parse(input: &str) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            nodes.push(Node::Text(rest[..start].to_string()));
        }

        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| Error::Parse {
            detail: "Unterminated {{ action".to_string(),
        })?;

        nodes.push(Node::Action(parse_action(&after[..end])?));
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        nodes.push(Node::Text(rest.to_string()));
    }

    Ok(nodes)
}

fn parse_action(action: &str) -> Result<Pipeline> {
    let tokens = tokenize(action)?;

    if tokens.is_empty() {
        return Err(Error::Parse {
            detail: "Empty {{ }} action".to_string(),
        });
    }

    let mut stages = tokens.split(|t| *t == Token::Pipe);

    let head_tokens = stages.next().unwrap_or_default();
    let head = parse_head(head_tokens)?;

    let mut calls = Vec::new();

    for stage in stages {
        calls.push(parse_call(stage, true)?);
    }

    Ok(Pipeline { head, calls })
}

/// The first pipeline stage: a lone literal or data ref, or a full call.
fn parse_head(tokens: &[Token]) -> Result<Expr> {
    match tokens {
        [] => Err(Error::Parse {
            detail: "Empty pipeline stage".to_string(),
        }),
        [Token::Literal(s)] => Ok(Expr::Literal(s.clone())),
        [Token::DataRef(segments)] => Ok(Expr::DataRef(segments.clone())),
        _ => {
            let (func, args) = parse_call(tokens, false)?;
            Ok(Expr::Call(func, args))
        }
    }
}

/// A function call stage. A piped stage receives the previous value as its
/// final argument, so its declared arity is one less.
fn parse_call(tokens: &[Token], piped: bool) -> Result<(Func, Vec<Expr>)> {
    let [Token::Ident(name), rest @ ..] = tokens else {
        return Err(Error::Parse {
            detail: "Expected a function name".to_string(),
        });
    };

    let func = Func::resolve(name).ok_or_else(|| Error::Parse {
        detail: format!("Unknown function {name:?}"),
    })?;

    let mut args = Vec::with_capacity(rest.len());

    for token in rest {
        match token {
            Token::Literal(s) => args.push(Expr::Literal(s.clone())),
            Token::DataRef(segments) => args.push(Expr::DataRef(segments.clone())),
            _ => {
                return Err(Error::Parse {
                    detail: format!("Unexpected argument in call to {name:?}"),
                });
            }
        }
    }

    // Every function in the namespace takes exactly one argument.
    let expected = if piped { 0 } else { 1 };

    if args.len() != expected {
        return Err(Error::Parse {
            detail: format!("Wrong number of arguments for {name:?}"),
        });
    }

    Ok((func, args))
}

fn tokenize(action: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = action.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '|' {
            chars.next();
            tokens.push(Token::Pipe);
        } else if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;

            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    _ => value.push(c),
                }
            }

            if !closed {
                return Err(Error::Parse {
                    detail: "Unterminated string literal".to_string(),
                });
            }

            tokens.push(Token::Literal(value));
        } else if c == '.' {
            chars.next();
            let mut segments = Vec::new();
            let mut segment = String::new();

            loop {
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        segment.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if segment.is_empty() {
                    return Err(Error::Parse {
                        detail: "Empty data reference segment".to_string(),
                    });
                }

                segments.push(std::mem::take(&mut segment));

                if chars.peek() == Some(&'.') {
                    chars.next();
                } else {
                    break;
                }
            }

            tokens.push(Token::DataRef(segments));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut name = String::new();

            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }

            tokens.push(Token::Ident(name));
        } else {
            return Err(Error::Parse {
                detail: format!("Unexpected character {c:?} in action"),
            });
        }
    }

    Ok(tokens)
}
