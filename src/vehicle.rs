extern crate chrono;
extern crate serde;

// Wire format of GET /api/lines/{number}. Field names are the backend's.
// Nothing is validated: missing or null fields decode to defaults.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VehicleId {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for VehicleId {
    fn default() -> VehicleId {
        return VehicleId::Text("".to_string());
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            VehicleId::Number(n) => write!(f, "{}", n),
            VehicleId::Text(ref s) => write!(f, "{}", s),
            VehicleId::Other(serde_json::Value::Null) => Ok(()),
            VehicleId::Other(ref v) => write!(f, "{}", v),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    let value: Option<T> = serde::Deserialize::deserialize(deserializer)?;
    return Ok(value.unwrap_or_default());
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearestStop {
    #[serde(default, deserialize_with = "null_as_default", rename = "stopName")]
    pub stop_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: VehicleId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lat: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lon: f64,

    #[serde(default, deserialize_with = "null_as_default", rename = "disabili")]
    pub accessible: bool,
    #[serde(default, deserialize_with = "null_as_default", rename = "aggiornamento")]
    pub last_update: String,
    #[serde(default, deserialize_with = "null_as_default", rename = "occupazione")]
    pub occupancy: String,
    #[serde(default, deserialize_with = "null_as_default", rename = "fermata_vicina")]
    pub nearest_stop: NearestStop,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub line: String,
    pub vehicles: Vec<Vehicle>,
    pub last_update: Option<chrono::DateTime<chrono::Utc>>,
}

impl ViewState {
    pub fn empty() -> ViewState {
        return ViewState{
            line: "".to_string(),
            vehicles: vec![],
            last_update: None,
        };
    }

    pub fn is_tracking(&self) -> bool {
        return !self.line.is_empty();
    }
}

pub fn parse_vehicles(body: &str) -> crate::result::SeguiResult<Vec<Vehicle>> {
    let vehicles: Vec<Vehicle> = serde_json::from_str(body)?;
    return Ok(vehicles);
}
