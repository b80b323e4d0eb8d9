//! Field extraction from vehicle-position entities.
//!
//! Each output column is an [`EntityField`]: a name plus a plain extraction
//! function that walks `entity -> vehicle -> trip/position -> value`, checking
//! every optional hop explicitly. A missing hop yields [`NONE`] for that single
//! column; the rest of the record is unaffected.

use std::fmt;

use thiserror::Error;

use crate::gtfs_rt::{FeedEntity, Position, TripDescriptor, VehiclePosition};

/// Sentinel written for a field that is absent on an entity.
pub const NONE: &str = "None";

/// Extraction function for one column. `None` means the value is absent.
pub type Extractor = fn(&FeedEntity) -> Option<String>;

/// One named column of the output schema.
#[derive(Clone, Copy)]
pub struct EntityField {
    name: &'static str,
    extract: Extractor,
}

impl EntityField {
    pub const fn new(name: &'static str, extract: Extractor) -> Self {
        Self { name, extract }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the raw extracted value, or `None` when any hop is unset.
    pub fn extract(&self, entity: &FeedEntity) -> Option<String> {
        (self.extract)(entity)
    }

    /// Renders the value as text, substituting [`NONE`] when absent.
    pub fn render(&self, entity: &FeedEntity) -> String {
        self.extract(entity).unwrap_or_else(|| NONE.to_string())
    }
}

impl fmt::Debug for EntityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityField").field(&self.name).finish()
    }
}

/// Every column this crate knows how to extract, in default output order.
pub static VEHICLE_POSITION_FIELDS: [EntityField; 13] = [
    EntityField::new("timestamp", timestamp),
    EntityField::new("trip_id", trip_id),
    EntityField::new("trip_start_time", trip_start_time),
    EntityField::new("trip_start_date", trip_start_date),
    EntityField::new("route_id", route_id),
    EntityField::new("direction_id", direction_id),
    EntityField::new("latitude", latitude),
    EntityField::new("longitude", longitude),
    EntityField::new("bearing", bearing),
    EntityField::new("current_stop_sequence", current_stop_sequence),
    EntityField::new("current_status", current_status),
    EntityField::new("stop_id", stop_id),
    EntityField::new("occupancy_status", occupancy_status),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown field '{0}'")]
pub struct UnknownField(pub String);

/// Ordered output schema. Fixes both the header row and every record's
/// column order; it is built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    fields: Vec<EntityField>,
}

impl FieldSpec {
    pub fn new(fields: Vec<EntityField>) -> Self {
        Self { fields }
    }

    /// The full default schema.
    pub fn vehicle_positions() -> Self {
        Self::new(VEHICLE_POSITION_FIELDS.to_vec())
    }

    /// Picks columns from [`VEHICLE_POSITION_FIELDS`] by name, in the order
    /// the names are given.
    pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownField> {
        let fields = names
            .iter()
            .map(|name| {
                let name = name.as_ref().trim();
                VEHICLE_POSITION_FIELDS
                    .iter()
                    .find(|f| f.name == name)
                    .copied()
                    .ok_or_else(|| UnknownField(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(fields))
    }

    pub fn fields(&self) -> &[EntityField] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(EntityField::name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders one entity into a record, one value per field.
    pub fn render(&self, entity: &FeedEntity) -> Vec<String> {
        self.fields.iter().map(|f| f.render(entity)).collect()
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::vehicle_positions()
    }
}

fn vehicle(e: &FeedEntity) -> Option<&VehiclePosition> {
    e.vehicle.as_ref()
}

fn trip(e: &FeedEntity) -> Option<&TripDescriptor> {
    vehicle(e)?.trip.as_ref()
}

fn position(e: &FeedEntity) -> Option<&Position> {
    vehicle(e)?.position.as_ref()
}

pub fn timestamp(e: &FeedEntity) -> Option<String> {
    vehicle(e)?.timestamp.map(|v| v.to_string())
}

pub fn trip_id(e: &FeedEntity) -> Option<String> {
    trip(e)?.trip_id.clone()
}

pub fn trip_start_time(e: &FeedEntity) -> Option<String> {
    trip(e)?.start_time.clone()
}

pub fn trip_start_date(e: &FeedEntity) -> Option<String> {
    trip(e)?.start_date.clone()
}

pub fn route_id(e: &FeedEntity) -> Option<String> {
    trip(e)?.route_id.clone()
}

pub fn direction_id(e: &FeedEntity) -> Option<String> {
    trip(e)?.direction_id.map(|v| v.to_string())
}

pub fn latitude(e: &FeedEntity) -> Option<String> {
    position(e)?.latitude.map(|v| v.to_string())
}

pub fn longitude(e: &FeedEntity) -> Option<String> {
    position(e)?.longitude.map(|v| v.to_string())
}

pub fn bearing(e: &FeedEntity) -> Option<String> {
    position(e)?.bearing.map(|v| v.to_string())
}

pub fn current_stop_sequence(e: &FeedEntity) -> Option<String> {
    vehicle(e)?.current_stop_sequence.map(|v| v.to_string())
}

/// Raw wire integer of `VehicleStopStatus`.
pub fn current_status(e: &FeedEntity) -> Option<String> {
    vehicle(e)?.current_status.map(|v| v.to_string())
}

pub fn stop_id(e: &FeedEntity) -> Option<String> {
    vehicle(e)?.stop_id.clone()
}

/// Raw wire integer of `OccupancyStatus`.
pub fn occupancy_status(e: &FeedEntity) -> Option<String> {
    vehicle(e)?.occupancy_status.map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::vehicle_position::{OccupancyStatus, VehicleStopStatus};

    fn full_entity() -> FeedEntity {
        FeedEntity {
            id: "v1".to_string(),
            vehicle: Some(VehiclePosition {
                trip: Some(TripDescriptor {
                    trip_id: Some("T1".to_string()),
                    start_time: Some("08:15:00".to_string()),
                    start_date: Some("20231114".to_string()),
                    route_id: Some("Red".to_string()),
                    direction_id: Some(1),
                    ..Default::default()
                }),
                position: Some(Position {
                    latitude: Some(42.35),
                    longitude: Some(-71.0625),
                    bearing: Some(90.0),
                    ..Default::default()
                }),
                timestamp: Some(1700000000),
                current_stop_sequence: Some(7),
                current_status: Some(VehicleStopStatus::StoppedAt as i32),
                stop_id: Some("place-dwnxg".to_string()),
                occupancy_status: Some(OccupancyStatus::FewSeatsAvailable as i32),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_schema_order() {
        let names: Vec<_> = FieldSpec::vehicle_positions().names().collect();
        assert_eq!(
            names,
            [
                "timestamp",
                "trip_id",
                "trip_start_time",
                "trip_start_date",
                "route_id",
                "direction_id",
                "latitude",
                "longitude",
                "bearing",
                "current_stop_sequence",
                "current_status",
                "stop_id",
                "occupancy_status",
            ]
        );
    }

    #[test]
    fn test_render_fully_populated_entity() {
        let record = FieldSpec::vehicle_positions().render(&full_entity());
        assert_eq!(
            record,
            [
                "1700000000",
                "T1",
                "08:15:00",
                "20231114",
                "Red",
                "1",
                "42.35",
                "-71.0625",
                "90",
                "7",
                "1",
                "place-dwnxg",
                "2",
            ]
        );
    }

    #[test]
    fn test_missing_position_only_affects_position_fields() {
        let mut entity = full_entity();
        entity.vehicle.as_mut().unwrap().position = None;

        let record = FieldSpec::vehicle_positions().render(&entity);
        assert_eq!(record.len(), 13);
        assert_eq!(&record[6..9], [NONE, NONE, NONE]);
        assert_eq!(record[0], "1700000000");
        assert_eq!(record[1], "T1");
        assert_eq!(record[12], "2");
    }

    #[test]
    fn test_missing_trip_only_affects_trip_fields() {
        let mut entity = full_entity();
        entity.vehicle.as_mut().unwrap().trip = None;

        let record = FieldSpec::vehicle_positions().render(&entity);
        assert_eq!(&record[1..6], [NONE; 5]);
        assert_eq!(record[6], "42.35");
    }

    #[test]
    fn test_unset_scalar_inside_present_trip() {
        let mut entity = full_entity();
        entity.vehicle.as_mut().unwrap().trip.as_mut().unwrap().direction_id = None;

        assert_eq!(direction_id(&entity), None);
        assert_eq!(trip_id(&entity).as_deref(), Some("T1"));
    }

    #[test]
    fn test_position_without_coordinates() {
        let mut entity = full_entity();
        let position = entity.vehicle.as_mut().unwrap().position.as_mut().unwrap();
        position.latitude = None;
        position.longitude = None;

        let record = FieldSpec::vehicle_positions().render(&entity);
        assert_eq!(&record[6..9], [NONE, NONE, "90"]);
    }

    #[test]
    fn test_entity_without_vehicle_renders_all_none() {
        let entity = FeedEntity {
            id: "alert-1".to_string(),
            ..Default::default()
        };
        let record = FieldSpec::vehicle_positions().render(&entity);
        assert!(record.iter().all(|v| v == NONE));
    }

    #[test]
    fn test_select_subset_keeps_given_order() {
        let spec = FieldSpec::select(&["latitude", "timestamp"]).unwrap();
        assert_eq!(spec.names().collect::<Vec<_>>(), ["latitude", "timestamp"]);
        assert_eq!(spec.render(&full_entity()), ["42.35", "1700000000"]);
    }

    #[test]
    fn test_select_rejects_unknown_field() {
        let err = FieldSpec::select(&["timestamp", "speed"]).unwrap_err();
        assert_eq!(err, UnknownField("speed".to_string()));
    }

    #[test]
    fn test_scenario_timestamp_trip_latitude() {
        let spec = FieldSpec::select(&["timestamp", "trip_id", "latitude"]).unwrap();
        let entity = FeedEntity {
            id: "e".to_string(),
            vehicle: Some(VehiclePosition {
                timestamp: Some(100),
                trip: Some(TripDescriptor {
                    trip_id: Some("T1".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(spec.render(&entity), ["100", "T1", "None"]);
    }
}
