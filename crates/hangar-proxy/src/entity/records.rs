//! Record types for the eight entity kinds.
//!
//! Field names match the snake_case keys produced by the response decoder.
//! The identifier serialises as `ID`.

use serde::{Deserialize, Serialize};

/// An airplane under production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airplane {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Model name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// City of the building facility.
    pub city: String,
    /// State of the building facility.
    pub state: String,
    /// Current production stage.
    pub production_stage: String,
    /// Total cost.
    pub cost: f64,
    /// Start date, `YYYY-MM-DD`.
    pub date_started: String,
    /// Completion date, `YYYY-MM-DD`.
    pub date_finished: String,
    /// Facility building the airplane.
    pub facility_id: i64,
    /// Passenger seats.
    pub seating_capacity: i64,
    /// Size class.
    pub size: String,
    /// Whether the cabin has a first class section.
    pub has_first_class: bool,
}

/// Link between an airplane and one of its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirplaneToComponent {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Linked airplane.
    pub airplane_id: i64,
    /// Linked component.
    pub component_id: i64,
}

/// A component built for airplanes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Component name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// City of the producing facility.
    pub city: String,
    /// State of the producing facility.
    pub state: String,
    /// Component category.
    pub component_type: String,
    /// Producing facility.
    pub facility_id: i64,
    /// Unit cost.
    pub cost: f64,
    /// Current production stage.
    pub production_stage: String,
}

/// A customer ordering airplanes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Customer name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// A production facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Facility name.
    pub name: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Free-form description.
    pub description: String,
    /// Components currently in production.
    pub components_in_production: i64,
    /// Components completed.
    pub components_completed: i64,
    /// Airplane models currently in production.
    pub models_in_production: i64,
    /// Airplane models completed.
    pub models_completed: i64,
    /// Head count.
    pub employee_count: i64,
    /// Managing manager.
    pub manager_id: i64,
}

/// A facility manager account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manager {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Manager name.
    pub name: String,
    /// Account password as stored by the backend.
    pub password: String,
    /// Job title.
    pub position: String,
    /// Access level.
    pub access_level: i64,
    /// Managed facility.
    pub facility_id: i64,
}

/// A component supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Supplier name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Component categories supplied.
    pub component_types: String,
    /// Facilities supplied.
    pub facilities_supplying: String,
}

/// Link between a supplier and a facility it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierToFacility {
    /// Record identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Linked supplier.
    pub supplier_id: i64,
    /// Linked facility.
    pub facility_id: i64,
}
