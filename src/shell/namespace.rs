// ABOUTME: Values and the name-to-value map shared by scripts and the console.
// ABOUTME: Built once before the session starts; scripts may overwrite any binding.

use crate::config::ResolvedOptions;
use crate::gmp::Response;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value a name can be bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Response(Response),
    /// The session's GMP client.
    Client,
    /// The help object.
    Help,
    /// The resolved command-line options.
    Args(Arc<ResolvedOptions>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::Response(_) => "Response",
            Value::Client => "Gmp",
            Value::Help => "Help",
            Value::Args(_) => "Args",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Echo form used by the console: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }

    /// Convert a JSON scalar from the serialized options.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Str(n.to_string()),
            },
            serde_json::Value::String(s) => Value::Str(s),
            other => Value::Str(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => f.write_str(s),
            Value::Response(r) => write!(f, "{}", r),
            Value::Client => write!(f, "<Gmp client>"),
            Value::Help => f.write_str(super::HELP_TEXT),
            Value::Args(args) => match serde_json::to_string(args.as_ref()) {
                Ok(json) => write!(f, "Args({})", json),
                Err(_) => write!(f, "Args(...)"),
            },
        }
    }
}

/// Names visible to scripts and the console.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    bindings: BTreeMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace with `gmp`/`client`, `help` and `args` bound.
    pub fn with_builtins(args: ResolvedOptions) -> Self {
        let mut namespace = Self::new();
        namespace.set("gmp", Value::Client);
        namespace.set("client", Value::Client);
        namespace.set("help", Value::Help);
        namespace.set("args", Value::Args(Arc::new(args)));
        namespace
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Bind `name`, replacing any earlier binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use std::path::PathBuf;

    fn options() -> ResolvedOptions {
        ResolvedOptions {
            connection: ConnectionConfig::Socket {
                path: PathBuf::from("/run/gvmd.sock"),
                timeout: None,
            },
            config: None,
            loglevel: None,
            interactive: false,
            gmp_username: "admin".to_string(),
            gmp_password: String::new(),
            script: vec![],
        }
    }

    #[test]
    fn builtins_are_bound() {
        let namespace = Namespace::with_builtins(options());
        let names: Vec<_> = namespace.names().collect();
        assert_eq!(names, vec!["args", "client", "gmp", "help"]);
        assert_eq!(namespace.get("gmp"), Some(&Value::Client));
    }

    #[test]
    fn later_bindings_replace_builtins() {
        let mut namespace = Namespace::with_builtins(options());
        namespace.set("help", Value::Int(3));
        assert_eq!(namespace.get("help"), Some(&Value::Int(3)));
    }

    #[test]
    fn repr_quotes_strings_only() {
        assert_eq!(Value::Str("it's".to_string()).repr(), r"'it\'s'");
        assert_eq!(Value::Int(7).repr(), "7");
        assert_eq!(Value::Bool(true).repr(), "True");
    }

    #[test]
    fn args_display_as_json() {
        let shown = Value::Args(Arc::new(options())).to_string();
        assert!(shown.contains(r#""connection_type":"socket""#));
        assert!(shown.contains(r#""gmp_username":"admin""#));
    }
}
