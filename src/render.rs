use crate::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStyle {
    Success,
    Secondary,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub text: String,
    pub style: BadgeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    pub accessibility: Badge,
    pub last_update: String,
    pub occupancy: Badge,
    pub nearest_stop: Badge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub key: String,
    pub lat: f64,
    pub lon: f64,
    pub popup: Popup,
}

pub const ACCESSIBLE: &'static str = "Accessibile";
pub const NOT_ACCESSIBLE: &'static str = "Non accessibile";

pub fn accessibility_badge(accessible: bool) -> Badge {
    if accessible {
        return Badge{ text: ACCESSIBLE.to_string(), style: BadgeStyle::Success };
    }
    return Badge{ text: NOT_ACCESSIBLE.to_string(), style: BadgeStyle::Secondary };
}

fn info_badge(text: &str) -> Badge {
    return Badge{ text: text.to_string(), style: BadgeStyle::Info };
}

/// One marker per vehicle, in input order, keyed by vehicle id.
pub fn project(vehicles: &[Vehicle]) -> Vec<Marker> {
    return vehicles.iter().map(|v| {
        return Marker{
            key: v.id.to_string(),
            lat: v.lat,
            lon: v.lon,
            popup: Popup{
                title: format!("Vettura {}", v.id),
                accessibility: accessibility_badge(v.accessible),
                last_update: format!("Aggiornamento: {}", v.last_update),
                occupancy: info_badge(&v.occupancy),
                nearest_stop: info_badge(&v.nearest_stop.stop_name),
            },
        };
    }).collect();
}
