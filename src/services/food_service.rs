use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    CreateFoodRequest, Food, FoodId, ServiceError, ServiceResult, UpdateFoodRequest, Validate,
};
use crate::repositories::FoodRepository;

pub const WELCOME_MESSAGE: &str = "Welcome to Bunny Expert API, where you will get a list of edible and inedible foods for rabbits.";

/// Upper bound on the number of records returned by a single listing
pub const MAX_LIST_RESULTS: usize = 1000;

/// Service for managing the food catalog
pub struct FoodService {
    repository: Arc<dyn FoodRepository>,
}

impl FoodService {
    pub fn new(repository: Arc<dyn FoodRepository>) -> Self {
        Self { repository }
    }

    pub fn welcome(&self) -> &'static str {
        WELCOME_MESSAGE
    }

    /// Persist a new food under a fresh id and return the stored record.
    ///
    /// The record is re-read after the insert. If it vanished in between
    /// (a concurrent delete), `None` is returned rather than an error.
    #[instrument(skip(self, request), fields(food = %request.food))]
    pub async fn create_food(&self, request: CreateFoodRequest) -> ServiceResult<Option<Food>> {
        crate::info_with_trace!("Creating new food");

        request.validate()?;

        let food = Food::new(request);
        let id = self.repository.insert(food).await?;

        let stored = self.repository.find_by_id(&id).await?;
        match &stored {
            Some(_) => crate::info_with_trace!(food_id = %id, "Food created successfully"),
            None => crate::warn_with_trace!(
                food_id = %id,
                "Food was removed before it could be read back"
            ),
        }

        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn list_foods(&self) -> ServiceResult<Vec<Food>> {
        crate::info_with_trace!("Listing foods");

        let foods = self.repository.find_all(MAX_LIST_RESULTS).await?;

        crate::info_with_trace!("Found {} foods", foods.len());
        Ok(foods)
    }

    /// Exact, case-sensitive match on the `food` attribute
    #[instrument(skip(self), fields(name = %name))]
    pub async fn get_food_by_name(&self, name: &str) -> ServiceResult<Food> {
        crate::info_with_trace!("Retrieving food by name");

        match self.repository.find_by_name(name).await? {
            Some(food) => Ok(food),
            None => {
                crate::warn_with_trace!("Food not found");
                Err(not_found(name))
            }
        }
    }

    /// Merge the supplied fields into the record and return its current state.
    ///
    /// A zero modified count is not an error on its own: the id may exist
    /// with identical values, so the record is read back before reporting
    /// it missing.
    #[instrument(skip(self, request), fields(id = %raw_id))]
    pub async fn update_food(
        &self,
        raw_id: &str,
        request: UpdateFoodRequest,
    ) -> ServiceResult<Food> {
        crate::info_with_trace!("Updating food");

        request.validate()?;
        let changes = request.into_changes();

        let id = parse_id(raw_id)?;

        if !changes.is_empty() {
            let outcome = self.repository.update_fields(&id, &changes).await?;

            if outcome.modified_count == 1 {
                if let Some(updated) = self.repository.find_by_id(&id).await? {
                    crate::info_with_trace!("Food updated successfully");
                    return Ok(updated);
                }
            }
        }

        match self.repository.find_by_id(&id).await? {
            Some(existing) => {
                crate::info_with_trace!("No changes applied, returning existing food");
                Ok(existing)
            }
            None => {
                crate::warn_with_trace!("Food not found for update");
                Err(not_found(raw_id))
            }
        }
    }

    #[instrument(skip(self), fields(id = %raw_id))]
    pub async fn delete_food(&self, raw_id: &str) -> ServiceResult<()> {
        crate::info_with_trace!("Deleting food");

        let id = parse_id(raw_id)?;

        let deleted = self.repository.delete(&id).await?;
        if deleted == 1 {
            crate::info_with_trace!("Food deleted successfully");
            Ok(())
        } else {
            crate::warn_with_trace!(deleted_count = deleted, "Food not found for delete");
            Err(not_found(raw_id))
        }
    }
}

/// An id that does not parse can never be stored, so it reads as not found
fn parse_id(raw_id: &str) -> ServiceResult<FoodId> {
    FoodId::parse(raw_id).map_err(|_| not_found(raw_id))
}

fn not_found(key: &str) -> ServiceError {
    ServiceError::FoodNotFound {
        key: key.to_string(),
    }
}
