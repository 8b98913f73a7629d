// Services module - business logic layer

pub mod food_service;

pub use food_service::{FoodService, MAX_LIST_RESULTS, WELCOME_MESSAGE};
