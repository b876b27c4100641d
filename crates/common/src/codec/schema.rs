//! Per-type schema cache
//!
//! serde types carry their element name and field list in the calls their
//! `Deserialize` impl makes. [`SchemaCache`] captures that once per type by
//! driving the impl against a probe that records the call and stops.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::forward_to_deserialize_any;

/// Mapping metadata of one typed payload kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    /// Rust type path, for diagnostics.
    pub type_name: &'static str,
    /// Root element name, if the type deserializes as a named struct.
    pub element_name: Option<&'static str>,
    /// Serialized field names (`@`-prefixed for attributes).
    pub fields: &'static [&'static str],
}

impl TypeSchema {
    fn probe<T: DeserializeOwned>() -> Self {
        let mut probe = SchemaProbe::default();
        // The probe always halts; only the captured shape matters.
        let _ = T::deserialize(&mut probe);

        Self {
            type_name: std::any::type_name::<T>(),
            element_name: probe.element_name,
            fields: probe.fields,
        }
    }
}

/// Concurrent, populate-once schema cache keyed by type identity.
///
/// Two threads racing on a cold entry may both probe; the results are
/// identical and the later insert wins.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: DashMap<TypeId, Arc<TypeSchema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned + 'static>(&self) -> Arc<TypeSchema> {
        let key = TypeId::of::<T>();
        if let Some(schema) = self.schemas.get(&key) {
            return Arc::clone(schema.value());
        }

        let schema = Arc::new(TypeSchema::probe::<T>());
        tracing::trace!(
            type_name = schema.type_name,
            element = schema.element_name.unwrap_or("-"),
            "cached type schema"
        );
        self.schemas.insert(key, Arc::clone(&schema));
        schema
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[derive(Debug, Default)]
struct SchemaProbe {
    element_name: Option<&'static str>,
    fields: &'static [&'static str],
}

#[derive(Debug)]
struct ProbeHalt;

impl fmt::Display for ProbeHalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("schema probe halted")
    }
}

impl std::error::Error for ProbeHalt {}

impl de::Error for ProbeHalt {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        ProbeHalt
    }
}

impl<'de> Deserializer<'de> for &mut SchemaProbe {
    type Error = ProbeHalt;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeHalt> {
        Err(ProbeHalt)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeHalt> {
        self.element_name = Some(name);
        self.fields = fields;
        Err(ProbeHalt)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, ProbeHalt> {
        self.element_name = Some(name);
        Err(ProbeHalt)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, ProbeHalt> {
        self.element_name = Some(name);
        Err(ProbeHalt)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeHalt> {
        self.element_name = Some(name);
        Err(ProbeHalt)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit seq tuple tuple_struct map identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename = "Employer")]
    #[allow(dead_code)]
    struct Employer {
        #[serde(rename = "@Name")]
        name: String,
        #[serde(rename = "EffectiveDate")]
        effective_date: String,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Job {
        status: String,
    }

    #[test]
    fn captures_element_name_and_fields() {
        let cache = SchemaCache::new();
        let schema = cache.get::<Employer>();

        assert_eq!(schema.element_name, Some("Employer"));
        assert_eq!(schema.fields, &["@Name", "EffectiveDate"]);
        assert!(schema.type_name.ends_with("Employer"));
    }

    #[test]
    fn unrenamed_struct_uses_rust_name() {
        assert_eq!(SchemaCache::new().get::<Job>().element_name, Some("Job"));
    }

    #[test]
    fn non_struct_types_have_no_element_name() {
        let cache = SchemaCache::new();
        assert_eq!(cache.get::<HashMap<String, String>>().element_name, None);
        assert_eq!(cache.get::<String>().element_name, None);
    }

    #[test]
    fn schema_is_built_once_per_type() {
        let cache = SchemaCache::new();
        let first = cache.get::<Employer>();
        let second = cache.get::<Employer>();
        cache.get::<Job>();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_readers_share_entries() {
        let cache = Arc::new(SchemaCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get::<Employer>().element_name)
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("Employer"));
        }
        assert_eq!(cache.len(), 1);
    }
}
