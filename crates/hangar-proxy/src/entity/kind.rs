//! Entity kinds and their field schemas.

use serde_json::{Map, Value};
use strum::{Display, IntoStaticStr};

use super::{Entity, EntityError};

/// Scalar type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string.
    Text,
    /// JSON integer.
    Integer,
    /// JSON number; integers are accepted.
    Float,
    /// JSON boolean.
    Boolean,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Integer => value.is_i64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Integer => "an integer",
            Self::Float => "a number",
            Self::Boolean => "a boolean",
        }
    }
}

/// One named, typed field of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name in snake_case.
    pub name: &'static str,
    /// Expected scalar type.
    pub ty: FieldType,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Text,
        }
    }

    const fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Integer,
        }
    }

    const fn float(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Float,
        }
    }

    const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Boolean,
        }
    }
}

/// Key every entity uses for its own identifier.
pub const ID_KEY: &str = "ID";

/// Key naming an entity's kind in its JSON form.
pub const TYPE_KEY: &str = "type";

const AIRPLANE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::text("description"),
    FieldSpec::text("city"),
    FieldSpec::text("state"),
    FieldSpec::text("production_stage"),
    FieldSpec::float("cost"),
    FieldSpec::text("date_started"),
    FieldSpec::text("date_finished"),
    FieldSpec::integer("facility_id"),
    FieldSpec::integer("seating_capacity"),
    FieldSpec::text("size"),
    FieldSpec::boolean("has_first_class"),
];

const AIRPLANE_TO_COMPONENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("airplane_id"),
    FieldSpec::integer("component_id"),
];

const COMPONENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::text("description"),
    FieldSpec::text("city"),
    FieldSpec::text("state"),
    FieldSpec::text("component_type"),
    FieldSpec::integer("facility_id"),
    FieldSpec::float("cost"),
    FieldSpec::text("production_stage"),
];

const CUSTOMER_FIELDS: &[FieldSpec] = &[FieldSpec::text("name"), FieldSpec::text("description")];

const FACILITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::text("city"),
    FieldSpec::text("state"),
    FieldSpec::text("description"),
    FieldSpec::integer("components_in_production"),
    FieldSpec::integer("components_completed"),
    FieldSpec::integer("models_in_production"),
    FieldSpec::integer("models_completed"),
    FieldSpec::integer("employee_count"),
    FieldSpec::integer("manager_id"),
];

const MANAGER_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::text("password"),
    FieldSpec::text("position"),
    FieldSpec::integer("access_level"),
    FieldSpec::integer("facility_id"),
];

const SUPPLIER_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::text("description"),
    FieldSpec::text("component_types"),
    FieldSpec::text("facilities_supplying"),
];

const SUPPLIER_TO_FACILITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("supplier_id"),
    FieldSpec::integer("facility_id"),
];

/// The eight entity kinds served by the backend.
///
/// `Display` yields the kind name used on the wire (`entityName`) and in the
/// `type` tag of an entity's JSON form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr,
)]
pub enum EntityKind {
    /// Airplanes.
    Airplane,
    /// Airplane to component links.
    AirplaneToComponent,
    /// Components.
    Component,
    /// Customers.
    Customer,
    /// Facilities.
    Facility,
    /// Facility managers.
    Manager,
    /// Suppliers.
    Supplier,
    /// Supplier to facility links.
    SupplierToFacility,
}

impl EntityKind {
    /// Every kind, in registry order.
    pub const ALL: [Self; 8] = [
        Self::Airplane,
        Self::AirplaneToComponent,
        Self::Component,
        Self::Customer,
        Self::Facility,
        Self::Manager,
        Self::Supplier,
        Self::SupplierToFacility,
    ];

    /// Kind name as sent to the backend.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Gateway route segment, which doubles as the cache and snapshot key.
    #[must_use]
    pub fn route(self) -> &'static str {
        match self {
            Self::Airplane => "airplane",
            Self::AirplaneToComponent => "airplanecomponent",
            Self::Component => "component",
            Self::Customer => "customer",
            Self::Facility => "facility",
            Self::Manager => "manager",
            Self::Supplier => "supplier",
            Self::SupplierToFacility => "supplierfacility",
        }
    }

    /// Finds the kind whose route is exactly `route`.
    #[must_use]
    pub fn from_route(route: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.route() == route)
    }

    /// Snake-cased key under which the backend reports the entity's own ID.
    ///
    /// The backend sends `facilityId` for a facility; after case conversion
    /// that becomes `facility_id`, which is renamed to [`ID_KEY`].
    #[must_use]
    pub fn self_id_key(self) -> String {
        format!("{}_id", self.name().to_ascii_lowercase())
    }

    /// Field schema, excluding the identifier.
    #[must_use]
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Airplane => AIRPLANE_FIELDS,
            Self::AirplaneToComponent => AIRPLANE_TO_COMPONENT_FIELDS,
            Self::Component => COMPONENT_FIELDS,
            Self::Customer => CUSTOMER_FIELDS,
            Self::Facility => FACILITY_FIELDS,
            Self::Manager => MANAGER_FIELDS,
            Self::Supplier => SUPPLIER_FIELDS,
            Self::SupplierToFacility => SUPPLIER_TO_FACILITY_FIELDS,
        }
    }

    /// Builds an entity of this kind from its field values and a fresh ID.
    ///
    /// Any `ID` or `type` key already present in `fields` is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::MalformedEntity`] when the fields do not match
    /// the schema.
    pub fn build(self, id: i64, mut fields: Map<String, Value>) -> Result<Entity, EntityError> {
        fields.remove(TYPE_KEY);
        fields.insert(ID_KEY.to_owned(), Value::from(id));
        self.decode(fields)
    }

    /// Reconstructs an entity of this kind from a document carrying `ID` and
    /// every schema field.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::MalformedEntity`] when a field is missing,
    /// unexpected or of the wrong type.
    pub fn decode(self, mut document: Map<String, Value>) -> Result<Entity, EntityError> {
        self.validate(&document)?;
        document.insert(TYPE_KEY.to_owned(), Value::from(self.name()));
        serde_json::from_value(Value::Object(document))
            .map_err(|error| EntityError::malformed(self.name(), error.to_string()))
    }

    fn validate(self, document: &Map<String, Value>) -> Result<(), EntityError> {
        match document.get(ID_KEY) {
            Some(value) if value.is_i64() => {}
            Some(_) => return Err(EntityError::malformed(self.name(), "`ID` must be an integer")),
            None => return Err(EntityError::malformed(self.name(), "missing field `ID`")),
        }

        for field in self.fields() {
            let value = document.get(field.name).ok_or_else(|| {
                EntityError::malformed(self.name(), format!("missing field `{}`", field.name))
            })?;
            if !field.ty.accepts(value) {
                return Err(EntityError::malformed(
                    self.name(),
                    format!("field `{}` must be {}", field.name, field.ty.label()),
                ));
            }
        }

        let schema = self.fields();
        if let Some(extra) = document
            .keys()
            .find(|key| *key != ID_KEY && !schema.iter().any(|field| field.name == key.as_str()))
        {
            return Err(EntityError::malformed(
                self.name(),
                format!("unexpected field `{extra}`"),
            ));
        }
        Ok(())
    }
}
