// ABOUTME: Evaluates parsed statements against a namespace and a GMP client.
// ABOUTME: Shared by script execution and the interactive console.

use super::error::{CommandSnafu, OutputSnafu, ScriptError};
use super::namespace::{Namespace, Value};
use super::parser::{Argument, Expr, Statement, parse_line};
use crate::gmp::Gmp;
use futures::FutureExt;
use futures::future::BoxFuture;
use snafu::ResultExt;
use std::io::Write;

/// Evaluated call arguments.
#[derive(Debug, Default)]
struct CallArgs {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl CallArgs {
    fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    fn param(&self, index: usize, name: &str) -> Option<&Value> {
        self.keywords
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
            .or_else(|| self.positional.get(index))
    }

    fn string(&self, method: &str, index: usize, name: &str) -> Result<String, ScriptError> {
        match self.param(index, name) {
            Some(Value::Str(s)) => Ok(s.clone()),
            Some(other) => Err(ScriptError::Type {
                message: format!(
                    "{}() argument '{}' must be str, not {}",
                    method,
                    name,
                    other.type_name()
                ),
            }),
            None => Err(ScriptError::Type {
                message: format!("{}() missing required argument '{}'", method, name),
            }),
        }
    }

    fn expect_none(&self, method: &str) -> Result<(), ScriptError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ScriptError::Type {
                message: format!("{}() takes no arguments", method),
            })
        }
    }
}

/// Render a value as a GMP attribute, or `None` to omit it.
fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::None => None,
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        other => Some(other.to_string()),
    }
}

pub struct Interpreter<'a> {
    client: &'a mut Gmp,
    out: &'a mut (dyn Write + Send),
}

impl<'a> Interpreter<'a> {
    pub fn new(client: &'a mut Gmp, out: &'a mut (dyn Write + Send)) -> Self {
        Self { client, out }
    }

    pub fn client(&mut self) -> &mut Gmp {
        &mut *self.client
    }

    /// Write one line to the session output.
    pub fn write_line(&mut self, line: &str) -> Result<(), ScriptError> {
        writeln!(self.out, "{}", line).context(OutputSnafu)?;
        self.out.flush().context(OutputSnafu)
    }

    /// Run a whole script, line by line, in `namespace`.
    ///
    /// Stops at the first failing line.
    pub async fn execute(&mut self, namespace: &mut Namespace, source: &str) -> Result<(), ScriptError> {
        for (index, line) in source.lines().enumerate() {
            self.eval_statement(namespace, line)
                .await
                .map_err(|e| ScriptError::AtLine {
                    line: index + 1,
                    source: Box::new(e),
                })?;
        }
        Ok(())
    }

    /// Evaluate one line. Returns the value of an expression statement.
    pub async fn eval_statement(
        &mut self,
        namespace: &mut Namespace,
        line: &str,
    ) -> Result<Option<Value>, ScriptError> {
        match parse_line(line)? {
            None => Ok(None),
            Some(Statement::Assign { name, value }) => {
                let value = self.eval(namespace, &value).await?;
                tracing::debug!("Binding {} to {}", name, value.type_name());
                namespace.set(name, value);
                Ok(None)
            }
            Some(Statement::Expr(expr)) => Ok(Some(self.eval(namespace, &expr).await?)),
        }
    }

    /// Console echo form of a value.
    pub fn repr(&self, value: &Value) -> String {
        match value {
            Value::Client => self.describe_client(),
            other => other.repr(),
        }
    }

    fn display(&self, value: &Value) -> String {
        match value {
            Value::Client => self.describe_client(),
            other => other.to_string(),
        }
    }

    fn describe_client(&self) -> String {
        format!("<Gmp {}>", self.client.endpoint())
    }

    fn eval<'b>(
        &'b mut self,
        namespace: &'b Namespace,
        expr: &'b Expr,
    ) -> BoxFuture<'b, Result<Value, ScriptError>> {
        async move {
            match expr {
                Expr::Literal(value) => Ok(value.clone()),
                Expr::Name(name) => namespace.get(name).cloned().ok_or_else(|| {
                    ScriptError::UndefinedName { name: name.clone() }
                }),
                Expr::Attribute { target, name } => {
                    let target = self.eval(namespace, target).await?;
                    attribute(&target, name)
                }
                Expr::Call { function, args } => {
                    let args = self.eval_args(namespace, args).await?;
                    match function.as_ref() {
                        Expr::Attribute { target, name } => {
                            let target = self.eval(namespace, target).await?;
                            self.call_method(&target, name, args).await
                        }
                        Expr::Name(name) if !namespace.contains(name) => {
                            self.call_builtin(name, args)
                        }
                        other => {
                            let callee = self.eval(namespace, other).await?;
                            self.call_value(&callee, args)
                        }
                    }
                }
            }
        }
        .boxed()
    }

    async fn eval_args(
        &mut self,
        namespace: &Namespace,
        args: &[Argument],
    ) -> Result<CallArgs, ScriptError> {
        let mut evaluated = CallArgs::default();
        for arg in args {
            match arg {
                Argument::Positional(expr) => {
                    let value = self.eval(namespace, expr).await?;
                    evaluated.positional.push(value);
                }
                Argument::Keyword { name, value } => {
                    let value = self.eval(namespace, value).await?;
                    evaluated.keywords.push((name.clone(), value));
                }
            }
        }
        Ok(evaluated)
    }

    fn call_builtin(&mut self, name: &str, args: CallArgs) -> Result<Value, ScriptError> {
        match name {
            "print" => {
                if !args.keywords.is_empty() {
                    return Err(ScriptError::Type {
                        message: "print() takes no keyword arguments".to_string(),
                    });
                }
                let line = args
                    .positional
                    .iter()
                    .map(|value| self.display(value))
                    .collect::<Vec<_>>()
                    .join(" ");
                self.write_line(&line)?;
                Ok(Value::None)
            }
            _ => Err(ScriptError::UndefinedName {
                name: name.to_string(),
            }),
        }
    }

    fn call_value(&mut self, callee: &Value, args: CallArgs) -> Result<Value, ScriptError> {
        match callee {
            Value::Help => {
                args.expect_none("help")?;
                self.write_line(super::HELP_TEXT)?;
                Ok(Value::None)
            }
            other => Err(ScriptError::Type {
                message: format!("'{}' object is not callable", other.type_name()),
            }),
        }
    }

    async fn call_method(
        &mut self,
        target: &Value,
        method: &str,
        args: CallArgs,
    ) -> Result<Value, ScriptError> {
        if !matches!(target, Value::Client) {
            return Err(ScriptError::NoAttribute {
                kind: target.type_name(),
                attribute: method.to_string(),
            });
        }

        match method {
            "authenticate" => {
                let username = args.string(method, 0, "username")?;
                let password = args.string(method, 1, "password")?;
                let response = self
                    .client
                    .authenticate(&username, &password)
                    .await
                    .context(CommandSnafu)?;
                Ok(Value::Response(response))
            }
            "send_command" => {
                let command = args.string(method, 0, "cmd")?;
                let response = self
                    .client
                    .send_command(&command)
                    .await
                    .context(CommandSnafu)?;
                Ok(Value::Response(response))
            }
            "disconnect" => {
                args.expect_none(method)?;
                self.client.disconnect().await.context(CommandSnafu)?;
                Ok(Value::None)
            }
            "is_connected" => {
                args.expect_none(method)?;
                Ok(Value::Bool(self.client.is_connected()))
            }
            _ => {
                if !args.positional.is_empty() {
                    return Err(ScriptError::Type {
                        message: format!("{}() accepts keyword arguments only", method),
                    });
                }
                let attributes: Vec<(String, String)> = args
                    .keywords
                    .iter()
                    .filter_map(|(key, value)| attribute_value(value).map(|v| (key.clone(), v)))
                    .collect();
                let response = self
                    .client
                    .command(method, &attributes)
                    .await
                    .context(CommandSnafu)?;
                Ok(Value::Response(response))
            }
        }
    }
}

fn attribute(target: &Value, name: &str) -> Result<Value, ScriptError> {
    let missing = || ScriptError::NoAttribute {
        kind: target.type_name(),
        attribute: name.to_string(),
    };
    let optional = |value: Option<&str>| value.map_or(Value::None, |v| Value::Str(v.to_string()));

    match target {
        Value::Response(response) => match name {
            "status" => Ok(optional(response.status())),
            "status_text" => Ok(optional(response.status_text())),
            "xml" => Ok(Value::Str(response.xml().to_string())),
            "name" => Ok(Value::Str(response.name().to_string())),
            _ => Err(missing()),
        },
        Value::Args(args) => {
            let serde_json::Value::Object(mut fields) =
                serde_json::to_value(args.as_ref()).map_err(|_| missing())?
            else {
                return Err(missing());
            };
            fields.remove(name).map(Value::from_json).ok_or_else(missing)
        }
        _ => Err(missing()),
    }
}
