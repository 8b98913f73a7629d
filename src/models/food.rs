use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::{ValidationError, ValidationResult};

/// Stored attribute names, shared by the JSON shape and the table items.
pub const ID_ATTR: &str = "id";
pub const FOOD_ATTR: &str = "food";
pub const QUANTITY_ATTR: &str = "quantity";
pub const IMG_URL_ATTR: &str = "imgURL";

/// Identifier of a food record.
///
/// Always holds a canonical hyphenated lowercase UUID. Construct it with
/// [`FoodId::generate`] for new records or [`FoodId::parse`] for anything
/// arriving from outside the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FoodId(String);

impl FoodId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn parse(raw: &str) -> ValidationResult<Self> {
        Uuid::try_parse(raw.trim())
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| ValidationError::InvalidFormat {
                field: "_id".to_string(),
                expected: "UUID".to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FoodId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FoodId> for String {
    fn from(id: FoodId) -> Self {
        id.0
    }
}

/// A food record as stored and as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    #[serde(rename = "_id", alias = "id")]
    pub id: FoodId,
    pub food: String,
    pub quantity: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
}

/// Request model for creating a new food record.
///
/// Any `_id` the client sends is ignored; ids are always generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFoodRequest {
    pub food: String,
    pub quantity: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
}

/// Request model for updating an existing food record.
///
/// Absent and `null` fields both deserialize to `None` and are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateFoodRequest {
    pub food: Option<String>,
    pub quantity: Option<String>,
    #[serde(rename = "imgURL")]
    pub img_url: Option<String>,
}

/// Field-level change-set for a merge-update, keyed by stored attribute name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoodChanges(BTreeMap<&'static str, String>);

/// What the store reports after a merge-update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl Food {
    /// Create a new Food with a freshly generated id
    pub fn new(request: CreateFoodRequest) -> Self {
        Self::with_id(FoodId::generate(), request)
    }

    pub fn with_id(id: FoodId, request: CreateFoodRequest) -> Self {
        Self {
            id,
            food: request.food,
            quantity: request.quantity,
            img_url: request.img_url,
        }
    }

    /// Merge the change-set into this record. Returns true if any value changed.
    pub fn apply(&mut self, changes: &FoodChanges) -> bool {
        let mut modified = false;
        for (attr, value) in changes.iter() {
            let slot = match attr {
                FOOD_ATTR => &mut self.food,
                QUANTITY_ATTR => &mut self.quantity,
                IMG_URL_ATTR => &mut self.img_url,
                _ => continue,
            };
            if slot.as_str() != value {
                *slot = value.to_string();
                modified = true;
            }
        }
        modified
    }
}

impl UpdateFoodRequest {
    /// Keep only the fields that were supplied
    pub fn into_changes(self) -> FoodChanges {
        let mut changes = BTreeMap::new();
        if let Some(food) = self.food {
            changes.insert(FOOD_ATTR, food);
        }
        if let Some(quantity) = self.quantity {
            changes.insert(QUANTITY_ATTR, quantity);
        }
        if let Some(img_url) = self.img_url {
            changes.insert(IMG_URL_ATTR, img_url);
        }
        FoodChanges(changes)
    }
}

impl FoodChanges {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, attr: &str) -> Option<&str> {
        self.0.get(attr).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.0.iter().map(|(attr, value)| (*attr, value.as_str()))
    }
}
