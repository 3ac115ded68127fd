//! Typed access to the `--endpoint` configuration document.
//!
//! An [Endpoint] wraps a parsed JSON object. It has no required keys of its
//! own: each plugin asks for the keys it needs and gets either the value in
//! the requested type, [PluginError::EndpointMissingRequiredData] or
//! [PluginError::EndpointDataTypeMismatch].

use serde_json::{Map, Value};

use super::error::PluginError;

const TRUTHY: [&str; 6] = ["1", "y", "yes", "t", "true", "on"];
const FALSY: [&str; 7] = ["0", "n", "no", "f", "false", "off", ""];

/// Configuration of one target or storage system instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoint {
    data: Map<String, Value>,
}

impl Endpoint {
    /// Parses the JSON handed over by `--endpoint`.
    ///
    /// An empty string means the flag was not supplied and is reported as a
    /// usage error. Anything that is not a JSON object is a JSON error.
    pub fn parse(json: &str) -> Result<Self, PluginError> {
        if json.is_empty() {
            return Err(PluginError::Usage(
                "Missing required --endpoint flag".to_string(),
            ));
        }

        let data = serde_json::from_str(json)?;
        Ok(Self { data })
    }

    pub fn from_map(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Names of all configured keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    fn get(&self, key: &str) -> Result<&Value, PluginError> {
        self.data
            .get(key)
            .ok_or_else(|| PluginError::missing_key(key))
    }

    pub fn string_value(&self, key: &str) -> Result<String, PluginError> {
        match self.get(key)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(PluginError::type_mismatch(key, "string")),
        }
    }

    pub fn float_value(&self, key: &str) -> Result<f64, PluginError> {
        match self.get(key)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| PluginError::type_mismatch(key, "numeric")),
            _ => Err(PluginError::type_mismatch(key, "numeric")),
        }
    }

    /// Reads a boolean, accepting the usual literals of hand-edited configs.
    ///
    /// Strings are matched case-insensitively against `1,y,yes,t,true,on` and
    /// `0,n,no,f,false,off,""`. The numbers `1` and `0` are accepted as well.
    /// Every other value must be a JSON boolean.
    pub fn boolean_value(&self, key: &str) -> Result<bool, PluginError> {
        match self.get(key)? {
            Value::String(s) => {
                let s = s.to_lowercase();
                if TRUTHY.contains(&s.as_str()) {
                    Ok(true)
                } else if FALSY.contains(&s.as_str()) {
                    Ok(false)
                } else {
                    Err(PluginError::type_mismatch(key, "boolean"))
                }
            }
            Value::Number(n) => match n.as_f64() {
                Some(v) if v == 1.0 => Ok(true),
                Some(v) if v == 0.0 => Ok(false),
                _ => Err(PluginError::type_mismatch(key, "boolean")),
            },
            Value::Bool(b) => Ok(*b),
            _ => Err(PluginError::type_mismatch(key, "boolean")),
        }
    }

    pub fn array_value(&self, key: &str) -> Result<&[Value], PluginError> {
        match self.get(key)? {
            Value::Array(values) => Ok(values),
            _ => Err(PluginError::type_mismatch(key, "array")),
        }
    }

    pub fn map_value(&self, key: &str) -> Result<&Map<String, Value>, PluginError> {
        match self.get(key)? {
            Value::Object(map) => Ok(map),
            _ => Err(PluginError::type_mismatch(key, "map")),
        }
    }

    /// Like [string_value](Self::string_value), but an absent key yields `default`.
    ///
    /// A present key of the wrong type is still an error.
    pub fn string_value_default(&self, key: &str, default: &str) -> Result<String, PluginError> {
        or_default(self.string_value(key), default.to_string())
    }

    pub fn float_value_default(&self, key: &str, default: f64) -> Result<f64, PluginError> {
        or_default(self.float_value(key), default)
    }

    pub fn boolean_value_default(&self, key: &str, default: bool) -> Result<bool, PluginError> {
        or_default(self.boolean_value(key), default)
    }
}

fn or_default<T>(value: Result<T, PluginError>, default: T) -> Result<T, PluginError> {
    match value {
        Err(e) if e.is_missing_key() => Ok(default),
        other => other,
    }
}
