use crate::core::equipment::EquipmentInventory;
use crate::core::utility_bills::UtilityBillRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{BufReader, Read};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};
use uuid::Uuid;

pub fn ingest_for_processing(json: impl Read) -> anyhow::Result<AuditInput> {
    Ok(serde_json::from_reader(BufReader::new(json))?)
}

/// Document describing everything needed for a full audit run.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditInput {
    pub building: BuildingProfile,
    #[serde(default)]
    pub equipment: Option<EquipmentInventory>,
    #[serde(default)]
    pub utility_bills: Option<UtilityBillRecord>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingProfile {
    #[serde(default, deserialize_with = "deserialize_optional_label")]
    pub business_type: Option<BusinessType>,
    pub floor_area_sq_ft: f64,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_label")]
    pub construction_year: Option<ConstructionYearBand>,
    #[serde(default, deserialize_with = "deserialize_optional_label")]
    pub primary_heating_fuel: Option<HeatingFuel>,
}

impl BuildingProfile {
    pub fn new(business_type: BusinessType, floor_area_sq_ft: f64) -> Self {
        Self {
            business_type: Some(business_type),
            floor_area_sq_ft,
            zip_code: None,
            construction_year: None,
            primary_heating_fuel: None,
        }
    }

    pub fn with_zip_code(self, zip_code: &str) -> Self {
        Self {
            zip_code: Some(zip_code.to_string()),
            ..self
        }
    }

    pub fn with_construction_year(self, construction_year: ConstructionYearBand) -> Self {
        Self {
            construction_year: Some(construction_year),
            ..self
        }
    }

    /// Whether the floor area is usable by the downstream calculations.
    pub fn has_valid_floor_area(&self) -> bool {
        is_valid_floor_area(self.floor_area_sq_ft)
    }
}

pub(crate) fn is_valid_floor_area(floor_area_sq_ft: f64) -> bool {
    floor_area_sq_ft.is_finite() && floor_area_sq_ft > 0.
}

/// Treats an empty or whitespace-only label as absent; any other label must name a known variant.
fn deserialize_optional_label<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let label: Option<String> = Option::deserialize(deserializer)?;
    match label.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => label
            .parse::<T>()
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("unrecognised label '{label}': {err}"))),
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize,
)]
pub enum BusinessType {
    Office,
    Retail,
    Restaurant,
    #[serde(rename = "Grocery Store")]
    #[strum(serialize = "Grocery Store")]
    GroceryStore,
    Warehouse,
    Manufacturing,
    Hotel,
    School,
    Healthcare,
}

impl BusinessType {
    /// Looks up a business type from a free-text label. Empty or unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "" => None,
            label => label.parse().ok(),
        }
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize,
)]
pub enum ConstructionYearBand {
    #[serde(rename = "Before 2000")]
    #[strum(serialize = "Before 2000")]
    Before2000,
    #[serde(rename = "2000-2010")]
    #[strum(serialize = "2000-2010")]
    From2000To2010,
    #[serde(rename = "After 2010")]
    #[strum(serialize = "After 2010")]
    After2010,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize)]
pub enum HeatingFuel {
    Electric,
    #[serde(rename = "Natural Gas")]
    #[strum(serialize = "Natural Gas")]
    NaturalGas,
    Propane,
    Oil,
    Other,
}

pub type EquipmentId = Uuid;

pub(crate) fn new_equipment_id() -> EquipmentId {
    Uuid::new_v4()
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
pub enum EquipmentCondition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
pub enum HvacSystemType {
    #[serde(rename = "Packaged Rooftop Unit")]
    #[strum(serialize = "Packaged Rooftop Unit")]
    PackagedRooftop,
    #[serde(rename = "Split System")]
    #[strum(serialize = "Split System")]
    SplitSystem,
    #[serde(rename = "Heat Pump")]
    #[strum(serialize = "Heat Pump")]
    HeatPump,
    Chiller,
    #[serde(rename = "PTAC")]
    #[strum(serialize = "PTAC")]
    Ptac,
    #[serde(rename = "VRF")]
    #[strum(serialize = "VRF")]
    Vrf,
    Other,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum CapacityUnit {
    #[default]
    #[serde(rename = "tons")]
    Tons,
    #[serde(rename = "BTU/hr")]
    BtuPerHour,
    #[serde(rename = "kW")]
    Kilowatts,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum HvacFuelType {
    #[default]
    Electric,
    #[serde(rename = "Natural Gas")]
    #[strum(serialize = "Natural Gas")]
    NaturalGas,
    Propane,
    Oil,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HvacUnit {
    #[serde(default = "new_equipment_id")]
    pub id: EquipmentId,
    #[serde(default)]
    pub name: Option<String>,
    pub system_type: HvacSystemType,
    pub capacity: f64,
    #[serde(default)]
    pub capacity_unit: CapacityUnit,
    /// EER-style rating where higher is better
    #[serde(default)]
    pub efficiency_rating: Option<f64>,
    #[serde(default)]
    pub age_years: Option<f64>,
    #[serde(default)]
    pub condition: EquipmentCondition,
    #[serde(default)]
    pub fuel_type: HvacFuelType,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
pub enum LightingControl {
    #[default]
    Manual,
    #[serde(rename = "Occupancy Sensor")]
    #[strum(serialize = "Occupancy Sensor")]
    OccupancySensor,
    #[serde(rename = "Daylight Sensor")]
    #[strum(serialize = "Daylight Sensor")]
    DaylightSensor,
    Timer,
    Dimmer,
    Smart,
    None,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum FixtureType {
    #[serde(rename = "LED")]
    #[strum(serialize = "LED")]
    Led,
    T12,
    T8,
    T5,
    #[serde(rename = "CFL")]
    #[strum(serialize = "CFL")]
    Cfl,
    Incandescent,
    Halogen,
    #[serde(rename = "Metal Halide")]
    #[strum(serialize = "Metal Halide")]
    MetalHalide,
    #[serde(rename = "High Pressure Sodium")]
    #[strum(serialize = "High Pressure Sodium")]
    HighPressureSodium,
    Other,
}

impl FixtureType {
    pub fn is_led(&self) -> bool {
        matches!(self, FixtureType::Led)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LightingZone {
    #[serde(default = "new_equipment_id")]
    pub id: EquipmentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fixture_type: Option<FixtureType>,
    pub fixture_count: u32,
    pub watts_per_fixture: f64,
    #[serde(default = "default_lamps_per_fixture")]
    pub lamps_per_fixture: u32,
    pub hours_per_day: f64,
    pub days_per_week: f64,
    #[serde(default)]
    pub control: LightingControl,
}

fn default_lamps_per_fixture() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
pub enum MajorEquipmentType {
    #[serde(rename = "Walk-in Cooler")]
    #[strum(serialize = "Walk-in Cooler")]
    WalkInCooler,
    #[serde(rename = "Walk-in Freezer")]
    #[strum(serialize = "Walk-in Freezer")]
    WalkInFreezer,
    #[serde(rename = "Reach-in Refrigerator")]
    #[strum(serialize = "Reach-in Refrigerator")]
    ReachInRefrigerator,
    #[serde(rename = "Ice Machine")]
    #[strum(serialize = "Ice Machine")]
    IceMachine,
    #[serde(rename = "Commercial Oven")]
    #[strum(serialize = "Commercial Oven")]
    CommercialOven,
    Dishwasher,
    #[serde(rename = "Air Compressor")]
    #[strum(serialize = "Air Compressor")]
    AirCompressor,
    Pump,
    Fan,
    Conveyor,
    #[serde(rename = "Process Motor")]
    #[strum(serialize = "Process Motor")]
    ProcessMotor,
    #[serde(rename = "Data Center")]
    #[strum(serialize = "Data Center")]
    DataCenter,
    Other,
}

impl MajorEquipmentType {
    pub fn is_refrigeration(&self) -> bool {
        matches!(
            self,
            MajorEquipmentType::WalkInCooler
                | MajorEquipmentType::WalkInFreezer
                | MajorEquipmentType::ReachInRefrigerator
                | MajorEquipmentType::IceMachine
        )
    }

    pub fn is_motor_driven(&self) -> bool {
        matches!(
            self,
            MajorEquipmentType::AirCompressor
                | MajorEquipmentType::Pump
                | MajorEquipmentType::Fan
                | MajorEquipmentType::Conveyor
                | MajorEquipmentType::ProcessMotor
        )
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MajorEquipmentItem {
    #[serde(default = "new_equipment_id")]
    pub id: EquipmentId,
    #[serde(default)]
    pub name: Option<String>,
    pub equipment_type: MajorEquipmentType,
    pub power_rating_kw: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub hours_per_day: f64,
    pub days_per_week: f64,
    #[serde(default)]
    pub has_vfd: bool,
    #[serde(default)]
    pub condition: EquipmentCondition,
    #[serde(default)]
    pub age_years: Option<f64>,
}

fn default_quantity() -> u32 {
    1
}

/// Parses a JSON document into any of the input records, used by the auditor import path.
pub(crate) fn from_json_str<T: DeserializeOwned>(json: &str) -> anyhow::Result<T> {
    Ok(serde_json::from_str(json)?)
}
