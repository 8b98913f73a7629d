use async_trait::async_trait;
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use crate::models::{
    Food, FoodChanges, FoodId, RepositoryError, RepositoryResult, UpdateOutcome, FOOD_ATTR,
    ID_ATTR, IMG_URL_ATTR, QUANTITY_ATTR,
};
use crate::observability::DatabaseTracingMiddleware;

type Item = HashMap<String, AttributeValue>;

/// Trait defining the interface for food data access operations
#[async_trait]
pub trait FoodRepository: Send + Sync {
    /// Insert a new record. Fails if the id is already taken.
    async fn insert(&self, food: Food) -> RepositoryResult<FoodId>;

    /// Find a food by its id
    async fn find_by_id(&self, id: &FoodId) -> RepositoryResult<Option<Food>>;

    /// Find the first food whose name matches exactly
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Food>>;

    /// Return at most `limit` foods in store order
    async fn find_all(&self, limit: usize) -> RepositoryResult<Vec<Food>>;

    /// Merge the change-set into an existing record. Never creates a record.
    async fn update_fields(
        &self,
        id: &FoodId,
        changes: &FoodChanges,
    ) -> RepositoryResult<UpdateOutcome>;

    /// Hard delete. Returns the number of records removed (0 or 1).
    async fn delete(&self, id: &FoodId) -> RepositoryResult<u64>;
}

/// DynamoDB implementation of the FoodRepository trait
pub struct DynamoDbFoodRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
    tracer: Option<DatabaseTracingMiddleware>,
}

impl DynamoDbFoodRepository {
    /// Create a new DynamoDB food repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
            tracer: None,
        }
    }

    /// Record operation counts and latencies for every store call
    pub fn with_tracer(mut self, tracer: DatabaseTracingMiddleware) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create a DynamoDB client span carrying the database semantic attributes
    fn create_dynamodb_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %self.table_name,
            "aws.request_id" = tracing::field::Empty,
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,
            "db.system" = "dynamodb",
            "db.name" = %self.table_name,
            "db.operation" = operation,
        )
    }

    /// Run a store call inside its client span, through the metrics tracer if one is set
    async fn traced<T, F>(&self, operation: &str, future: F) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        let call = future.instrument(self.create_dynamodb_span(operation));
        match &self.tracer {
            Some(tracer) => {
                tracer
                    .trace_operation(operation, &self.table_name, call)
                    .await
            }
            None => call.await,
        }
    }

    /// Convert a Food struct to DynamoDB attribute values
    pub fn food_to_item(&self, food: &Food) -> Item {
        let mut item = HashMap::new();

        item.insert(
            ID_ATTR.to_string(),
            AttributeValue::S(food.id.to_string()),
        );
        item.insert(FOOD_ATTR.to_string(), AttributeValue::S(food.food.clone()));
        item.insert(
            QUANTITY_ATTR.to_string(),
            AttributeValue::S(food.quantity.clone()),
        );
        item.insert(
            IMG_URL_ATTR.to_string(),
            AttributeValue::S(food.img_url.clone()),
        );

        item
    }

    /// Convert DynamoDB item to Food struct
    pub fn item_to_food(&self, item: Item) -> RepositoryResult<Food> {
        let string_attr = |name: &str| -> RepositoryResult<String> {
            item.get(name)
                .and_then(|v| v.as_s().ok())
                .cloned()
                .ok_or_else(|| RepositoryError::MalformedItem {
                    message: format!("Missing {}", name),
                })
        };

        let id = FoodId::parse(&string_attr(ID_ATTR)?).map_err(|e| {
            RepositoryError::MalformedItem {
                message: e.to_string(),
            }
        })?;

        Ok(Food {
            id,
            food: string_attr(FOOD_ATTR)?,
            quantity: string_attr(QUANTITY_ATTR)?,
            img_url: string_attr(IMG_URL_ATTR)?,
        })
    }

    fn id_key(id: &FoodId) -> AttributeValue {
        AttributeValue::S(id.to_string())
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);

        if let DynamoDbError::ResourceNotFoundException(_) = error {
            return RepositoryError::TableNotFound {
                table_name: self.table_name.clone(),
            };
        }

        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }

    fn parse_items(&self, items: Option<Vec<Item>>, foods: &mut Vec<Food>, limit: usize) {
        for item in items.unwrap_or_default() {
            if foods.len() >= limit {
                break;
            }
            match self.item_to_food(item) {
                Ok(food) => foods.push(food),
                Err(e) => {
                    warn!("Failed to parse food item: {}", e);
                    continue;
                }
            }
        }
    }
}

#[async_trait]
impl FoodRepository for DynamoDbFoodRepository {
    #[instrument(skip(self, food), fields(table = %self.table_name, id = %food.id))]
    async fn insert(&self, food: Food) -> RepositoryResult<FoodId> {
        info!("Inserting new food");

        let item = self.food_to_item(&food);

        self.traced("PutItem", async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| {
                    let collision = e
                        .as_service_error()
                        .map(|se| se.is_conditional_check_failed_exception())
                        .unwrap_or(false);
                    if collision {
                        RepositoryError::AlreadyExists {
                            id: food.id.to_string(),
                        }
                    } else {
                        self.map_dynamodb_error(e.into())
                    }
                })
        })
        .await?;

        info!("Food inserted successfully");
        Ok(food.id)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &FoodId) -> RepositoryResult<Option<Food>> {
        info!("Finding food by ID");

        let response = self
            .traced("GetItem", async {
                let result = self
                    .client
                    .get_item()
                    .table_name(&self.table_name)
                    .key(ID_ATTR, Self::id_key(id))
                    .consistent_read(true)
                    .send()
                    .await;

                if let Ok(output) = &result {
                    if let Some(request_id) = output.request_id() {
                        tracing::Span::current().record("aws.request_id", request_id);
                    }
                }

                result.map_err(|e| self.map_dynamodb_error(e.into()))
            })
            .await?;

        match response.item {
            Some(item) => {
                let food = self.item_to_food(item)?;
                info!("Food found");
                Ok(Some(food))
            }
            None => {
                info!("Food not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, name = %name))]
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Food>> {
        info!("Finding food by name");

        // A filtered scan can return empty pages, so keep paging until a match or the end
        let mut start_key: Option<Item> = None;
        loop {
            let response = self
                .traced("Scan", async {
                    self.client
                        .scan()
                        .table_name(&self.table_name)
                        .filter_expression("#food = :food")
                        .expression_attribute_names("#food", FOOD_ATTR)
                        .expression_attribute_values(":food", AttributeValue::S(name.to_string()))
                        .consistent_read(true)
                        .set_exclusive_start_key(start_key.take())
                        .send()
                        .await
                        .map_err(|e| self.map_dynamodb_error(e.into()))
                })
                .await?;

            let mut found = Vec::with_capacity(1);
            self.parse_items(response.items, &mut found, 1);
            if let Some(food) = found.pop() {
                info!("Food found");
                return Ok(Some(food));
            }

            match response.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        info!("Food not found");
        Ok(None)
    }

    #[instrument(skip(self), fields(table = %self.table_name, limit = limit))]
    async fn find_all(&self, limit: usize) -> RepositoryResult<Vec<Food>> {
        info!("Listing foods");

        let mut foods = Vec::new();
        let mut start_key: Option<Item> = None;
        while foods.len() < limit {
            let page_limit = i32::try_from(limit - foods.len()).unwrap_or(i32::MAX);
            let response = self
                .traced("Scan", async {
                    self.client
                        .scan()
                        .table_name(&self.table_name)
                        .consistent_read(true)
                        .limit(page_limit)
                        .set_exclusive_start_key(start_key.take())
                        .send()
                        .await
                        .map_err(|e| self.map_dynamodb_error(e.into()))
                })
                .await?;

            self.parse_items(response.items, &mut foods, limit);

            match response.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        info!("Found {} foods", foods.len());
        Ok(foods)
    }

    #[instrument(skip(self, changes), fields(table = %self.table_name, id = %id, change_count = changes.len()))]
    async fn update_fields(
        &self,
        id: &FoodId,
        changes: &FoodChanges,
    ) -> RepositoryResult<UpdateOutcome> {
        info!("Updating food fields");

        if changes.is_empty() {
            return Ok(UpdateOutcome::default());
        }

        let mut assignments = Vec::with_capacity(changes.len());
        let mut names = HashMap::new();
        let mut values = HashMap::new();
        for (index, (attr, value)) in changes.iter().enumerate() {
            assignments.push(format!("#f{index} = :v{index}"));
            names.insert(format!("#f{index}"), attr.to_string());
            values.insert(format!(":v{index}"), AttributeValue::S(value.to_string()));
        }

        let result = self
            .traced("UpdateItem", async {
                let result = self
                    .client
                    .update_item()
                    .table_name(&self.table_name)
                    .key(ID_ATTR, Self::id_key(id))
                    .update_expression(format!("SET {}", assignments.join(", ")))
                    .set_expression_attribute_names(Some(names))
                    .set_expression_attribute_values(Some(values))
                    .condition_expression("attribute_exists(id)")
                    .return_values(ReturnValue::UpdatedOld)
                    .send()
                    .await;

                match result {
                    Ok(output) => Ok(Some(output)),
                    Err(e)
                        if e.as_service_error()
                            .map(|se| se.is_conditional_check_failed_exception())
                            .unwrap_or(false) =>
                    {
                        Ok(None)
                    }
                    Err(e) => Err(self.map_dynamodb_error(e.into())),
                }
            })
            .await?;

        let outcome = match result {
            None => UpdateOutcome::default(),
            Some(output) => {
                // Attributes that did not exist before are absent from the old image
                let old = output.attributes.unwrap_or_default();
                let modified = changes.iter().any(|(attr, value)| {
                    old.get(attr).and_then(|v| v.as_s().ok()).map(String::as_str) != Some(value)
                });
                UpdateOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                }
            }
        };

        info!(
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "Food update applied"
        );
        Ok(outcome)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: &FoodId) -> RepositoryResult<u64> {
        info!("Deleting food");

        let response = self
            .traced("DeleteItem", async {
                self.client
                    .delete_item()
                    .table_name(&self.table_name)
                    .key(ID_ATTR, Self::id_key(id))
                    .return_values(ReturnValue::AllOld)
                    .send()
                    .await
                    .map_err(|e| self.map_dynamodb_error(e.into()))
            })
            .await?;

        let deleted = u64::from(response.attributes.is_some());
        info!("Deleted {} food", deleted);
        Ok(deleted)
    }
}
