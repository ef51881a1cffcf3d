//! Value type registry
//!
//! The registry is the capability table the engine and the codec consult
//! for everything they need to know about a value type: its display name,
//! its default instance and how it maps to and from its persisted payload.
//! It is built by the host and passed explicitly; there is no global table.
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = TypeRegistry::with_builtins();
//! registry.register(Arc::new(JsonType::new("color", "Color", json!("#000000"))));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::{ControlFlow, TypeTag, Value};

/// Capability every value type provides
pub trait ValueType: Send + Sync {
    /// Serialization tag, unique within a registry
    fn tag(&self) -> TypeTag;

    /// Human-readable type name
    fn name(&self) -> &str;

    /// Value used when nothing better is available
    fn default_value(&self) -> Value;

    /// Payload for a value of this type, `None` if the value has another type
    fn encode(&self, value: &Value) -> Option<serde_json::Value>;

    /// Value for a payload, `None` if the payload is malformed
    fn decode(&self, payload: &serde_json::Value) -> Option<Value>;
}

/// The two-valued gating type
pub struct ControlFlowType;

impl ValueType for ControlFlowType {
    fn tag(&self) -> TypeTag {
        TypeTag::CONTROL_FLOW
    }

    fn name(&self) -> &str {
        "Control Flow"
    }

    fn default_value(&self) -> Value {
        Value::ControlFlow(ControlFlow::default())
    }

    fn encode(&self, value: &Value) -> Option<serde_json::Value> {
        value
            .as_control_flow()
            .and_then(|flow| serde_json::to_value(flow).ok())
    }

    fn decode(&self, payload: &serde_json::Value) -> Option<Value> {
        serde_json::from_value::<ControlFlow>(payload.clone())
            .ok()
            .map(Value::ControlFlow)
    }
}

pub struct NumberType;

impl ValueType for NumberType {
    fn tag(&self) -> TypeTag {
        TypeTag::NUMBER
    }

    fn name(&self) -> &str {
        "Number"
    }

    fn default_value(&self) -> Value {
        Value::Number(0.0)
    }

    // JSON has no infinities or NaN, so those are written as strings
    fn encode(&self, value: &Value) -> Option<serde_json::Value> {
        let number = value.as_number()?;
        Some(if number.is_nan() {
            serde_json::Value::from("nan")
        } else if number == f64::INFINITY {
            serde_json::Value::from("inf")
        } else if number == f64::NEG_INFINITY {
            serde_json::Value::from("-inf")
        } else {
            serde_json::Value::from(number)
        })
    }

    fn decode(&self, payload: &serde_json::Value) -> Option<Value> {
        let number = match payload {
            serde_json::Value::String(text) => match text.as_str() {
                "nan" => f64::NAN,
                "inf" => f64::INFINITY,
                "-inf" => f64::NEG_INFINITY,
                _ => return None,
            },
            _ => payload.as_f64()?,
        };
        Some(Value::Number(number))
    }
}

pub struct TextType;

impl ValueType for TextType {
    fn tag(&self) -> TypeTag {
        TypeTag::TEXT
    }

    fn name(&self) -> &str {
        "Text"
    }

    fn default_value(&self) -> Value {
        Value::Text(String::new())
    }

    fn encode(&self, value: &Value) -> Option<serde_json::Value> {
        value.as_text().map(serde_json::Value::from)
    }

    fn decode(&self, payload: &serde_json::Value) -> Option<Value> {
        payload.as_str().map(|text| Value::Text(text.to_string()))
    }
}

pub struct BooleanType;

impl ValueType for BooleanType {
    fn tag(&self) -> TypeTag {
        TypeTag::BOOLEAN
    }

    fn name(&self) -> &str {
        "Boolean"
    }

    fn default_value(&self) -> Value {
        Value::Boolean(false)
    }

    fn encode(&self, value: &Value) -> Option<serde_json::Value> {
        value.as_boolean().map(serde_json::Value::from)
    }

    fn decode(&self, payload: &serde_json::Value) -> Option<Value> {
        payload.as_bool().map(Value::Boolean)
    }
}

/// Host-defined type whose values are arbitrary JSON payloads
///
/// Values are represented as [`Value::Custom`] carrying this type's tag.
pub struct JsonType {
    tag: TypeTag,
    name: String,
    default: serde_json::Value,
}

impl JsonType {
    pub fn new(tag: impl Into<String>, name: impl Into<String>, default: serde_json::Value) -> Self {
        Self {
            tag: TypeTag::new(tag),
            name: name.into(),
            default,
        }
    }
}

impl ValueType for JsonType {
    fn tag(&self) -> TypeTag {
        self.tag.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn default_value(&self) -> Value {
        Value::Custom {
            tag: self.tag.clone(),
            data: self.default.clone(),
        }
    }

    fn encode(&self, value: &Value) -> Option<serde_json::Value> {
        match value {
            Value::Custom { tag, data } if *tag == self.tag => Some(data.clone()),
            _ => None,
        }
    }

    fn decode(&self, payload: &serde_json::Value) -> Option<Value> {
        Some(Value::Custom {
            tag: self.tag.clone(),
            data: payload.clone(),
        })
    }
}

/// Registry of usable value types, keyed by tag
///
/// Control flow is always present and cannot be replaced.
pub struct TypeRegistry {
    types: HashMap<TypeTag, Arc<dyn ValueType>>,
    order: Vec<TypeTag>,
    control_flow: Arc<dyn ValueType>,
}

impl TypeRegistry {
    /// Create a registry holding only the control flow type
    pub fn new() -> Self {
        let control_flow: Arc<dyn ValueType> = Arc::new(ControlFlowType);
        let mut types = HashMap::new();
        types.insert(TypeTag::CONTROL_FLOW, control_flow.clone());
        Self {
            types,
            order: vec![TypeTag::CONTROL_FLOW],
            control_flow,
        }
    }

    /// Create a registry with number, text and boolean registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NumberType));
        registry.register(Arc::new(TextType));
        registry.register(Arc::new(BooleanType));
        registry
    }

    /// Register a value type, replacing any type with the same tag
    pub fn register(&mut self, value_type: Arc<dyn ValueType>) {
        let tag = value_type.tag();
        if tag.is_control_flow() {
            log::warn!("Ignoring registration that would replace the control flow type");
            return;
        }
        if self.types.insert(tag.clone(), value_type).is_none() {
            self.order.push(tag);
        } else {
            log::debug!("Replaced value type '{}'", tag);
        }
    }

    pub fn get(&self, tag: &TypeTag) -> Option<&Arc<dyn ValueType>> {
        self.types.get(tag)
    }

    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.types.contains_key(tag)
    }

    pub fn control_flow(&self) -> &Arc<dyn ValueType> {
        &self.control_flow
    }

    /// Look up a type, falling back to control flow for unknown tags
    ///
    /// The flag is `true` when the fallback was taken.
    pub fn resolve(&self, tag: &TypeTag) -> (&Arc<dyn ValueType>, bool) {
        match self.types.get(tag) {
            Some(value_type) => (value_type, false),
            None => (&self.control_flow, true),
        }
    }

    /// Default value of a type, control flow's default for unknown tags
    pub fn default_value(&self, tag: &TypeTag) -> Value {
        self.resolve(tag).0.default_value()
    }

    /// All types in registration order
    pub fn types(&self) -> impl Iterator<Item = &Arc<dyn ValueType>> {
        self.order.iter().filter_map(|tag| self.types.get(tag))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Add every type of another registry, overriding same-tag entries
    pub fn merge(&mut self, other: TypeRegistry) {
        for tag in other.order {
            if let Some(value_type) = other.types.get(&tag) {
                if !tag.is_control_flow() {
                    self.register(value_type.clone());
                }
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_contains_control_flow() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&TypeTag::CONTROL_FLOW));
        assert_eq!(registry.default_value(&TypeTag::CONTROL_FLOW), Value::SIGNAL);
    }

    #[test]
    fn test_with_builtins_order() {
        let registry = TypeRegistry::with_builtins();
        let tags: Vec<TypeTag> = registry.types().map(|t| t.tag()).collect();
        assert_eq!(
            tags,
            vec![
                TypeTag::CONTROL_FLOW,
                TypeTag::NUMBER,
                TypeTag::TEXT,
                TypeTag::BOOLEAN
            ]
        );
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let registry = TypeRegistry::with_builtins();
        let (value_type, fell_back) = registry.resolve(&TypeTag::new("missing"));
        assert!(fell_back);
        assert_eq!(value_type.tag(), TypeTag::CONTROL_FLOW);

        let (value_type, fell_back) = registry.resolve(&TypeTag::NUMBER);
        assert!(!fell_back);
        assert_eq!(value_type.name(), "Number");
    }

    #[test]
    fn test_control_flow_cannot_be_replaced() {
        struct Impostor;
        impl ValueType for Impostor {
            fn tag(&self) -> TypeTag {
                TypeTag::CONTROL_FLOW
            }
            fn name(&self) -> &str {
                "Impostor"
            }
            fn default_value(&self) -> Value {
                Value::Boolean(true)
            }
            fn encode(&self, _value: &Value) -> Option<serde_json::Value> {
                None
            }
            fn decode(&self, _payload: &serde_json::Value) -> Option<Value> {
                None
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register(Arc::new(Impostor));
        assert_eq!(registry.control_flow().name(), "Control Flow");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtin_payloads() {
        assert_eq!(NumberType.encode(&Value::Number(1.5)), Some(serde_json::json!(1.5)));
        assert_eq!(NumberType.encode(&Value::Boolean(true)), None);
        assert_eq!(
            ControlFlowType.decode(&serde_json::json!("noSignal")),
            Some(Value::NO_SIGNAL)
        );
        assert_eq!(TextType.decode(&serde_json::json!(3)), None);
    }

    #[test]
    fn test_json_type_and_merge() {
        let mut host = TypeRegistry::new();
        host.register(Arc::new(JsonType::new("color", "Color", serde_json::json!("#000"))));

        let mut registry = TypeRegistry::with_builtins();
        registry.merge(host);
        assert_eq!(registry.len(), 5);

        let color = TypeTag::new("color");
        let value = registry.get(&color).unwrap().decode(&serde_json::json!("#fff")).unwrap();
        assert_eq!(value.type_tag(), color);
        assert_eq!(
            registry.get(&color).unwrap().encode(&value),
            Some(serde_json::json!("#fff"))
        );
    }

    #[test]
    fn test_number_payloads_cover_non_finite_values() {
        for number in [f64::INFINITY, f64::NEG_INFINITY, -2.5] {
            let payload = NumberType.encode(&Value::Number(number)).unwrap();
            assert!(!payload.is_null());
            assert_eq!(NumberType.decode(&payload), Some(Value::Number(number)));
        }

        let payload = NumberType.encode(&Value::Number(f64::NAN)).unwrap();
        assert_eq!(payload, serde_json::json!("nan"));
        assert!(NumberType
            .decode(&payload)
            .and_then(|value| value.as_number())
            .is_some_and(f64::is_nan));
        assert_eq!(NumberType.decode(&serde_json::json!("seven")), None);
        assert_eq!(NumberType.decode(&serde_json::Value::Null), None);
    }
}
