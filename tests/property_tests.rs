use bunnyfood_rs::models::{
    validate_required_text, CreateFoodRequest, Food, FoodId, UpdateFoodRequest, Validate,
};
use proptest::prelude::*;

prop_compose! {
    fn arb_text()(text in "[a-zA-Z0-9 ]{0,40}") -> String {
        text
    }
}

prop_compose! {
    fn arb_non_empty_text()(text in "[a-zA-Z0-9 ]{1,40}") -> String {
        text
    }
}

prop_compose! {
    fn arb_create_request()(
        food in arb_non_empty_text(),
        quantity in arb_non_empty_text(),
        img_url in arb_non_empty_text(),
    ) -> CreateFoodRequest {
        CreateFoodRequest { food, quantity, img_url }
    }
}

prop_compose! {
    fn arb_update_request()(
        food in proptest::option::of(arb_non_empty_text()),
        quantity in proptest::option::of(arb_non_empty_text()),
        img_url in proptest::option::of(arb_non_empty_text()),
    ) -> UpdateFoodRequest {
        UpdateFoodRequest { food, quantity, img_url }
    }
}

proptest! {
    #[test]
    fn test_food_id_accepts_any_uuid(bytes in any::<[u8; 16]>()) {
        let uuid = uuid::Uuid::from_bytes(bytes);

        let from_hyphenated = FoodId::parse(&uuid.hyphenated().to_string()).unwrap();
        let from_simple = FoodId::parse(&uuid.simple().to_string().to_uppercase()).unwrap();

        prop_assert_eq!(&from_hyphenated, &from_simple);
        prop_assert_eq!(from_hyphenated.as_str(), uuid.to_string());
    }

    #[test]
    fn test_food_id_rejects_non_uuid_text(text in "[g-z ]{1,40}") {
        prop_assert!(FoodId::parse(&text).is_err());
    }

    #[test]
    fn test_required_text_rejects_only_empty(text in arb_text()) {
        let result = validate_required_text("food", &text);
        prop_assert_eq!(result.is_err(), text.is_empty());
    }

    #[test]
    fn test_valid_create_requests_pass(request in arb_create_request()) {
        prop_assert!(request.validate().is_ok());
    }

    #[test]
    fn test_changes_cover_exactly_supplied_fields(request in arb_update_request()) {
        prop_assert!(request.validate().is_ok());

        let supplied = [&request.food, &request.quantity, &request.img_url]
            .iter()
            .filter(|field| field.is_some())
            .count();
        let changes = request.clone().into_changes();

        prop_assert_eq!(changes.len(), supplied);
        prop_assert_eq!(changes.get("food"), request.food.as_deref());
        prop_assert_eq!(changes.get("quantity"), request.quantity.as_deref());
        prop_assert_eq!(changes.get("imgURL"), request.img_url.as_deref());
    }

    #[test]
    fn test_apply_only_touches_changed_fields(
        create in arb_create_request(),
        update in arb_update_request(),
    ) {
        let original = Food::new(create);
        let mut updated = original.clone();

        let changes = update.clone().into_changes();
        let modified = updated.apply(&changes);

        prop_assert_eq!(&updated.id, &original.id);
        prop_assert_eq!(&updated.food, update.food.as_ref().unwrap_or(&original.food));
        prop_assert_eq!(&updated.quantity, update.quantity.as_ref().unwrap_or(&original.quantity));
        prop_assert_eq!(&updated.img_url, update.img_url.as_ref().unwrap_or(&original.img_url));
        prop_assert_eq!(modified, updated != original);

        // Applying the same change-set again is a no-op
        prop_assert!(!updated.apply(&changes));
    }

    #[test]
    fn test_food_json_uses_wire_names(create in arb_create_request()) {
        let food = Food::new(create);
        let value = serde_json::to_value(&food).unwrap();

        prop_assert_eq!(value["_id"].as_str(), Some(food.id.as_str()));
        prop_assert_eq!(value["imgURL"].as_str(), Some(food.img_url.as_str()));
        prop_assert!(value.get("img_url").is_none());
    }
}
