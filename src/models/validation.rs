use super::{
    CreateFoodRequest, UpdateFoodRequest, ValidationError, ValidationResult, FOOD_ATTR,
    IMG_URL_ATTR, QUANTITY_ATTR,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

impl Validate for CreateFoodRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_text(FOOD_ATTR, &self.food)?;
        validate_required_text(QUANTITY_ATTR, &self.quantity)?;
        validate_required_text(IMG_URL_ATTR, &self.img_url)?;
        Ok(())
    }
}

impl Validate for UpdateFoodRequest {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(food) = &self.food {
            validate_required_text(FOOD_ATTR, food)?;
        }
        if let Some(quantity) = &self.quantity {
            validate_required_text(QUANTITY_ATTR, quantity)?;
        }
        if let Some(img_url) = &self.img_url {
            validate_required_text(IMG_URL_ATTR, img_url)?;
        }
        Ok(())
    }
}

/// Free-text fields must not be empty; any other string is accepted as-is
pub fn validate_required_text(field: &str, value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    Ok(())
}
