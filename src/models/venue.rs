use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::availability::parse_time_of_day;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub sport: Sport,
    pub location: String,
    pub price_per_hour: f64,
    pub capacity: u32,
    pub facilities: Vec<String>,
    pub rating: f64,
    pub image: String,
    pub description: String,
    pub open_time: String,
    pub close_time: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Cricket,
    Badminton,
    Tennis,
    Football,
}

impl Sport {
    pub const ALL: [Sport; 4] = [Sport::Cricket, Sport::Badminton, Sport::Tennis, Sport::Football];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Cricket => "cricket",
            Sport::Badminton => "badminton",
            Sport::Tennis => "tennis",
            Sport::Football => "football",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cricket" => Some(Sport::Cricket),
            "badminton" => Some(Sport::Badminton),
            "tennis" => Some(Sport::Tennis),
            "football" => Some(Sport::Football),
            _ => None,
        }
    }
}

/// Payload for registering a venue through the admin API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVenue {
    pub name: String,
    pub sport: Sport,
    pub location: String,
    pub price_per_hour: f64,
    pub capacity: u32,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    pub image: String,
    pub description: String,
    pub open_time: String,
    pub close_time: String,
}

impl NewVenue {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("name", &self.name),
            ("location", &self.location),
            ("image", &self.image),
            ("description", &self.description),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{field} is required"));
            }
        }

        validate_price(self.price_per_hour)?;
        validate_rating(self.rating)?;
        if self.capacity == 0 {
            return Err("capacity must be positive".to_string());
        }

        let open = parse_time_of_day(&self.open_time)?;
        let close = parse_time_of_day(&self.close_time)?;
        if open >= close {
            return Err("openTime must be earlier than closeTime".to_string());
        }
        Ok(())
    }

    pub fn into_venue(self, id: String, now: NaiveDateTime) -> Venue {
        Venue {
            id,
            name: self.name.trim().to_string(),
            sport: self.sport,
            location: self.location,
            price_per_hour: self.price_per_hour,
            capacity: self.capacity,
            facilities: self.facilities,
            rating: self.rating,
            image: self.image,
            description: self.description,
            open_time: self.open_time,
            close_time: self.close_time,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the mutable venue fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueUpdate {
    pub price_per_hour: Option<f64>,
    pub rating: Option<f64>,
    pub is_active: Option<bool>,
}

impl VenueUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(price) = self.price_per_hour {
            validate_price(price)?;
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }

    pub fn apply(&self, venue: &mut Venue) {
        if let Some(price) = self.price_per_hour {
            venue.price_per_hour = price;
        }
        if let Some(rating) = self.rating {
            venue.rating = rating;
        }
        if let Some(active) = self.is_active {
            venue.is_active = active;
        }
    }
}

fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price < 0.0 {
        return Err("pricePerHour must be a non-negative number".to_string());
    }
    Ok(())
}

fn validate_rating(rating: f64) -> Result<(), String> {
    if !(0.0..=5.0).contains(&rating) {
        return Err("rating must be between 0 and 5".to_string());
    }
    Ok(())
}
