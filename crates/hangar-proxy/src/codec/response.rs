//! Decoding of backend response documents into typed entities.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{DecodeError, to_snake_case};
use crate::entity::{Entity, EntityKind, EntityRegistry, ID_KEY, TYPE_KEY};

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    error: String,
    entities: Vec<Value>,
}

/// Decodes backend responses for one entity kind.
///
/// Each entity document has its keys converted to snake_case, its
/// `<kind>_id` key renamed to `ID`, and is then tagged with the kind name and
/// reconstructed through the registry.
#[derive(Debug, Clone)]
pub struct ResponseDecoder<'a> {
    registry: &'a EntityRegistry,
    kind_name: String,
}

impl<'a> ResponseDecoder<'a> {
    /// Builds a decoder for the kind called `kind_name`.
    ///
    /// The name is only resolved when a document is reconstructed, so an
    /// unknown name surfaces from [`ResponseDecoder::decode`].
    pub fn new(registry: &'a EntityRegistry, kind_name: impl Into<String>) -> Self {
        Self {
            registry,
            kind_name: kind_name.into(),
        }
    }

    /// Builds a decoder for a known kind.
    #[must_use]
    pub fn for_kind(registry: &'a EntityRegistry, kind: EntityKind) -> Self {
        Self::new(registry, kind.name())
    }

    /// Decodes one response document.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::BackendReported`] when `error` is non-blank,
    /// [`DecodeError::MalformedDocument`] when the envelope or an entity is
    /// not an object of the expected shape, and [`DecodeError::Entity`] when
    /// an entity does not fit its kind.
    pub fn decode(&self, document: &str) -> Result<Vec<Entity>, DecodeError> {
        let envelope: ResponseEnvelope = serde_json::from_str(document)
            .map_err(|error| DecodeError::malformed(error.to_string()))?;

        if !envelope.error.trim().is_empty() {
            return Err(DecodeError::BackendReported {
                message: envelope.error,
            });
        }

        let self_id_key = format!("{}_id", self.kind_name.to_ascii_lowercase());
        envelope
            .entities
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let Value::Object(fields) = value else {
                    return Err(DecodeError::malformed(format!(
                        "entity {index} is not an object"
                    )));
                };
                let document = self.clean(fields, &self_id_key);
                self.registry
                    .reconstruct(document)
                    .map_err(DecodeError::from)
            })
            .collect()
    }

    fn clean(&self, fields: Map<String, Value>, self_id_key: &str) -> Map<String, Value> {
        let mut cleaned: Map<String, Value> = fields
            .into_iter()
            .map(|(key, value)| (to_snake_case(&key), value))
            .collect();
        if let Some(id) = cleaned.remove(self_id_key) {
            cleaned.insert(ID_KEY.to_owned(), id);
        }
        cleaned.insert(TYPE_KEY.to_owned(), Value::from(self.kind_name.as_str()));
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::entity::{EntityError, Facility};

    #[fixture]
    fn registry() -> EntityRegistry {
        EntityRegistry::standard()
    }

    fn facility_document(id: i64, name: &str) -> Value {
        json!({
            "facilityId": id,
            "name": name,
            "city": "Seattle",
            "state": "WA",
            "description": "final assembly",
            "componentsInProduction": 4,
            "componentsCompleted": 10,
            "modelsInProduction": 2,
            "modelsCompleted": 7,
            "employeeCount": 120,
            "managerId": 3
        })
    }

    #[rstest]
    fn decodes_facility_documents(registry: EntityRegistry) {
        let document = json!({"error": "", "entities": [facility_document(42, "Alpha")]});

        let entities = ResponseDecoder::for_kind(&registry, EntityKind::Facility)
            .decode(&document.to_string())
            .expect("valid response");

        assert_eq!(
            entities,
            vec![Entity::Facility(Facility {
                id: 42,
                name: "Alpha".to_owned(),
                city: "Seattle".to_owned(),
                state: "WA".to_owned(),
                description: "final assembly".to_owned(),
                components_in_production: 4,
                components_completed: 10,
                models_in_production: 2,
                models_completed: 7,
                employee_count: 120,
                manager_id: 3,
            })]
        );
    }

    #[rstest]
    fn keeps_foreign_keys_distinct_from_own_id(registry: EntityRegistry) {
        let document = json!({"error": "", "entities": [{
            "managerId": 9, "name": "Ada", "password": "pw", "position": "lead",
            "accessLevel": 2, "facilityId": 42
        }]});

        let entities = ResponseDecoder::new(&registry, "Manager")
            .decode(&document.to_string())
            .expect("valid response");

        let value = serde_json::to_value(&entities[0]).expect("serialise");
        assert_eq!(value["ID"], json!(9));
        assert_eq!(value["facility_id"], json!(42));
    }

    #[rstest]
    #[case(json!({"error": "table missing", "entities": []}))]
    #[case(json!({"error": "partial", "entities": [facility_document(1, "a")]}))]
    fn backend_errors_are_failures(registry: EntityRegistry, #[case] document: Value) {
        let error = ResponseDecoder::for_kind(&registry, EntityKind::Facility)
            .decode(&document.to_string())
            .expect_err("backend error must not decode");
        assert!(matches!(error, DecodeError::BackendReported { .. }));
    }

    #[rstest]
    fn blank_error_with_no_entities_is_empty_success(registry: EntityRegistry) {
        let entities = ResponseDecoder::for_kind(&registry, EntityKind::Customer)
            .decode(r#"{"error": "  ", "entities": []}"#)
            .expect("blank error is success");
        assert!(entities.is_empty());
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"entities": []}"#)]
    #[case(r#"{"error": ""}"#)]
    #[case(r#"{"error": "", "entities": {}}"#)]
    #[case(r#"{"error": "", "entities": [1]}"#)]
    fn malformed_documents_are_rejected(registry: EntityRegistry, #[case] document: &str) {
        let error = ResponseDecoder::for_kind(&registry, EntityKind::Customer)
            .decode(document)
            .expect_err("malformed document");
        assert!(matches!(error, DecodeError::MalformedDocument { .. }));
    }

    #[rstest]
    fn unknown_kind_fails_reconstruction(registry: EntityRegistry) {
        let error = ResponseDecoder::new(&registry, "Hangar")
            .decode(r#"{"error": "", "entities": [{"hangarId": 1}]}"#)
            .expect_err("unknown kind");
        assert!(matches!(
            error,
            DecodeError::Entity(EntityError::UnknownEntityKind { .. })
        ));
    }

    #[rstest]
    fn missing_fields_are_malformed_entities(registry: EntityRegistry) {
        let error = ResponseDecoder::for_kind(&registry, EntityKind::Customer)
            .decode(r#"{"error": "", "entities": [{"customerId": 1, "name": "Skyways"}]}"#)
            .expect_err("missing description");
        assert!(matches!(
            error,
            DecodeError::Entity(EntityError::MalformedEntity { .. })
        ));
    }
}
