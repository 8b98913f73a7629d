#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bunnyfood_rs::{
    create_app,
    models::{
        Food, FoodChanges, FoodId, RepositoryError, RepositoryResult, UpdateOutcome,
    },
    repositories::FoodRepository,
    services::FoodService,
    Metrics,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

pub const TEST_MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Insertion-ordered store standing in for the DynamoDB table
#[derive(Default)]
pub struct InMemoryFoodRepository {
    foods: RwLock<Vec<Food>>,
}

impl InMemoryFoodRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.foods.read().await.len()
    }
}

#[async_trait]
impl FoodRepository for InMemoryFoodRepository {
    async fn insert(&self, food: Food) -> RepositoryResult<FoodId> {
        let mut foods = self.foods.write().await;
        if foods.iter().any(|existing| existing.id == food.id) {
            return Err(RepositoryError::AlreadyExists {
                id: food.id.to_string(),
            });
        }
        let id = food.id.clone();
        foods.push(food);
        Ok(id)
    }

    async fn find_by_id(&self, id: &FoodId) -> RepositoryResult<Option<Food>> {
        let foods = self.foods.read().await;
        Ok(foods.iter().find(|food| &food.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Food>> {
        let foods = self.foods.read().await;
        Ok(foods.iter().find(|food| food.food == name).cloned())
    }

    async fn find_all(&self, limit: usize) -> RepositoryResult<Vec<Food>> {
        let foods = self.foods.read().await;
        Ok(foods.iter().take(limit).cloned().collect())
    }

    async fn update_fields(
        &self,
        id: &FoodId,
        changes: &FoodChanges,
    ) -> RepositoryResult<UpdateOutcome> {
        let mut foods = self.foods.write().await;
        match foods.iter_mut().find(|food| &food.id == id) {
            Some(food) => Ok(UpdateOutcome {
                matched_count: 1,
                modified_count: u64::from(food.apply(changes)),
            }),
            None => Ok(UpdateOutcome::default()),
        }
    }

    async fn delete(&self, id: &FoodId) -> RepositoryResult<u64> {
        let mut foods = self.foods.write().await;
        match foods.iter().position(|food| &food.id == id) {
            Some(index) => {
                foods.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// Accepts writes but never finds anything, as if every record were deleted right after insert
pub struct VanishingFoodRepository;

#[async_trait]
impl FoodRepository for VanishingFoodRepository {
    async fn insert(&self, food: Food) -> RepositoryResult<FoodId> {
        Ok(food.id)
    }

    async fn find_by_id(&self, _id: &FoodId) -> RepositoryResult<Option<Food>> {
        Ok(None)
    }

    async fn find_by_name(&self, _name: &str) -> RepositoryResult<Option<Food>> {
        Ok(None)
    }

    async fn find_all(&self, _limit: usize) -> RepositoryResult<Vec<Food>> {
        Ok(Vec::new())
    }

    async fn update_fields(
        &self,
        _id: &FoodId,
        _changes: &FoodChanges,
    ) -> RepositoryResult<UpdateOutcome> {
        Ok(UpdateOutcome::default())
    }

    async fn delete(&self, _id: &FoodId) -> RepositoryResult<u64> {
        Ok(0)
    }
}

/// Every call fails as an unreachable store would
pub struct UnavailableFoodRepository;

fn unavailable<T>() -> RepositoryResult<T> {
    Err(RepositoryError::AwsSdk {
        message: "dispatch failure: connection refused".to_string(),
    })
}

#[async_trait]
impl FoodRepository for UnavailableFoodRepository {
    async fn insert(&self, _food: Food) -> RepositoryResult<FoodId> {
        unavailable()
    }

    async fn find_by_id(&self, _id: &FoodId) -> RepositoryResult<Option<Food>> {
        unavailable()
    }

    async fn find_by_name(&self, _name: &str) -> RepositoryResult<Option<Food>> {
        unavailable()
    }

    async fn find_all(&self, _limit: usize) -> RepositoryResult<Vec<Food>> {
        unavailable()
    }

    async fn update_fields(
        &self,
        _id: &FoodId,
        _changes: &FoodChanges,
    ) -> RepositoryResult<UpdateOutcome> {
        unavailable()
    }

    async fn delete(&self, _id: &FoodId) -> RepositoryResult<u64> {
        unavailable()
    }
}

/// The real router over the given repository
pub fn create_test_app(repository: Arc<dyn FoodRepository>) -> Router {
    let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
    let food_service = Arc::new(FoodService::new(repository));
    create_app(food_service, metrics, TEST_MAX_REQUEST_SIZE)
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub repository: Arc<InMemoryFoodRepository>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let repository = Arc::new(InMemoryFoodRepository::new());
        let app = create_test_app(repository.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            client: Client::new(),
            base_url,
            repository,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
