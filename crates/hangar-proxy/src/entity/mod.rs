//! Entity kinds, records and the kind registry.
//!
//! Every entity carries an integer `ID` and a fixed field list determined by
//! its [`EntityKind`]. Its JSON form is the record's fields plus a `type`
//! discriminator, for example `{"type": "Customer", "ID": 3, "name": "...",
//! "description": "..."}`. That form is what the gateway returns and what the
//! cache snapshot stores.

mod errors;
mod kind;
mod records;
mod registry;

use serde::{Deserialize, Serialize};

pub use self::errors::EntityError;
pub use self::kind::{EntityKind, FieldSpec, FieldType, ID_KEY, TYPE_KEY};
pub use self::records::{
    Airplane, AirplaneToComponent, Component, Customer, Facility, Manager, Supplier,
    SupplierToFacility,
};
pub use self::registry::EntityRegistry;

/// A typed entity of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entity {
    /// See [`Airplane`].
    Airplane(Airplane),
    /// See [`AirplaneToComponent`].
    AirplaneToComponent(AirplaneToComponent),
    /// See [`Component`].
    Component(Component),
    /// See [`Customer`].
    Customer(Customer),
    /// See [`Facility`].
    Facility(Facility),
    /// See [`Manager`].
    Manager(Manager),
    /// See [`Supplier`].
    Supplier(Supplier),
    /// See [`SupplierToFacility`].
    SupplierToFacility(SupplierToFacility),
}

macro_rules! with_record {
    ($entity:expr, $record:ident => $body:expr) => {
        match $entity {
            Entity::Airplane($record) => $body,
            Entity::AirplaneToComponent($record) => $body,
            Entity::Component($record) => $body,
            Entity::Customer($record) => $body,
            Entity::Facility($record) => $body,
            Entity::Manager($record) => $body,
            Entity::Supplier($record) => $body,
            Entity::SupplierToFacility($record) => $body,
        }
    };
}

impl Entity {
    /// The entity's identifier.
    #[must_use]
    pub fn id(&self) -> i64 {
        with_record!(self, record => record.id)
    }

    /// The entity's kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Airplane(_) => EntityKind::Airplane,
            Self::AirplaneToComponent(_) => EntityKind::AirplaneToComponent,
            Self::Component(_) => EntityKind::Component,
            Self::Customer(_) => EntityKind::Customer,
            Self::Facility(_) => EntityKind::Facility,
            Self::Manager(_) => EntityKind::Manager,
            Self::Supplier(_) => EntityKind::Supplier,
            Self::SupplierToFacility(_) => EntityKind::SupplierToFacility,
        }
    }
}
