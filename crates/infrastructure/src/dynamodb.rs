use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, Select};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use domain::{NewTask, Task, TaskFilter, TaskId};

use crate::repository::{StoreError, TaskRepository};

// Single-table layout: every task lives under one partition, with the
// ULID-suffixed sort key giving a creation-ordered range.
const TASK_PARTITION: &str = "TASK";
const SORT_KEY_PREFIX: &str = "TASK#";

fn sort_key(id: &TaskId) -> String {
    format!("{}{}", SORT_KEY_PREFIX, id.as_str())
}

/// DynamoDB-backed task store.
pub struct DynamoTaskRepository {
    client: Client,
    table_name: String,
}

impl DynamoTaskRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    /// Builds a client from the ambient AWS environment. An explicit
    /// endpoint overrides the resolved one, which is how local DynamoDB
    /// instances are reached.
    pub async fn connect(table_name: &str, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), table_name)
    }
}

#[async_trait]
impl TaskRepository for DynamoTaskRepository {
    async fn create(&self, new: NewTask) -> Result<Task, StoreError> {
        let task = new.into_task();

        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(TASK_PARTITION.to_string()))
            .item("SK", AttributeValue::S(sort_key(&task.id)))
            .item("id", AttributeValue::S(task.id.to_string()))
            .item("title", AttributeValue::S(task.title.clone()))
            .item("title_lc", AttributeValue::S(task.title.to_lowercase()))
            .item("complete", AttributeValue::Bool(task.complete))
            .item("created_at", AttributeValue::S(task.created_at.to_rfc3339()))
            .item("updated_at", AttributeValue::S(task.updated_at.to_rfc3339()));
        if let Some(description) = &task.description {
            request = request.item("description", AttributeValue::S(description.clone()));
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(task)
    }

    async fn find_all(
        &self,
        filter: &TaskFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = Vec::new();
        if limit == 0 {
            return Ok(tasks);
        }
        let mut to_skip = offset;
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(TASK_PARTITION.to_string()))
                .expression_attribute_values(
                    ":prefix",
                    AttributeValue::S(SORT_KEY_PREFIX.to_string()),
                )
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take());

            let parts = filter_expression(filter);
            if let Some(expression) = parts.expression {
                request = request.filter_expression(expression);
                for (placeholder, name) in parts.names {
                    request = request.expression_attribute_names(placeholder, name);
                }
                for (placeholder, value) in parts.values {
                    request = request.expression_attribute_values(placeholder, value);
                }
            }

            let output = request
                .send()
                .await
                .map_err(|e| StoreError::Storage(e.to_string()))?;

            for item in output.items() {
                let task = match item_to_task(item) {
                    Ok(task) => task,
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping malformed task item");
                        continue;
                    }
                };
                if to_skip > 0 {
                    to_skip -= 1;
                    continue;
                }
                tasks.push(task);
                if tasks.len() as u64 >= u64::from(limit) {
                    return Ok(tasks);
                }
            }

            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => return Ok(tasks),
            }
        }
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
            .key("SK", AttributeValue::S(sort_key(id)))
            .send()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        match output.item() {
            Some(item) => item_to_task(item).map(Some),
            None => Ok(None),
        }
    }

    async fn update(&self, id: &TaskId, task: &Task) -> Result<Option<Task>, StoreError> {
        let mut set_parts = vec![
            "#title = :title",
            "#title_lc = :title_lc",
            "#complete = :complete",
            "#updated_at = :updated_at",
        ];

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
            .key("SK", AttributeValue::S(sort_key(id)))
            .condition_expression("attribute_exists(PK)")
            .expression_attribute_names("#title", "title")
            .expression_attribute_names("#title_lc", "title_lc")
            .expression_attribute_names("#complete", "complete")
            .expression_attribute_names("#updated_at", "updated_at")
            .expression_attribute_names("#description", "description")
            .expression_attribute_values(":title", AttributeValue::S(task.title.clone()))
            .expression_attribute_values(":title_lc", AttributeValue::S(task.title.to_lowercase()))
            .expression_attribute_values(":complete", AttributeValue::Bool(task.complete))
            .expression_attribute_values(":updated_at", AttributeValue::S(Utc::now().to_rfc3339()))
            .return_values(ReturnValue::AllNew);

        // An absent description is removed rather than written as an
        // empty attribute, so reads stay symmetrical with creation.
        let expression = match &task.description {
            Some(description) => {
                set_parts.push("#description = :description");
                request = request.expression_attribute_values(
                    ":description",
                    AttributeValue::S(description.clone()),
                );
                format!("SET {}", set_parts.join(", "))
            }
            None => format!("SET {} REMOVE #description", set_parts.join(", ")),
        };

        let output = match request.update_expression(expression).send().await {
            Ok(output) => output,
            Err(err) => {
                if let SdkError::ServiceError(context) = &err {
                    if context.err().is_conditional_check_failed_exception() {
                        return Ok(None);
                    }
                }
                return Err(StoreError::Storage(err.to_string()));
            }
        };

        match output.attributes() {
            Some(item) => item_to_task(item).map(Some),
            None => Err(StoreError::Malformed(
                "update returned no attributes".to_string(),
            )),
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, StoreError> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(TASK_PARTITION.to_string()))
            .key("SK", AttributeValue::S(sort_key(id)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(output.attributes().is_some())
    }

    async fn count(&self, filter: &TaskFilter) -> Result<u64, StoreError> {
        let mut total: u64 = 0;
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(TASK_PARTITION.to_string()))
                .expression_attribute_values(
                    ":prefix",
                    AttributeValue::S(SORT_KEY_PREFIX.to_string()),
                )
                .select(Select::Count)
                .set_exclusive_start_key(start_key.take());

            let parts = filter_expression(filter);
            if let Some(expression) = parts.expression {
                request = request.filter_expression(expression);
                for (placeholder, name) in parts.names {
                    request = request.expression_attribute_names(placeholder, name);
                }
                for (placeholder, value) in parts.values {
                    request = request.expression_attribute_values(placeholder, value);
                }
            }

            let output = request
                .send()
                .await
                .map_err(|e| StoreError::Storage(e.to_string()))?;

            total += output.count() as u64;

            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => return Ok(total),
            }
        }
    }
}

/// Server-side filter over the queried partition. Placeholders are used
/// for every attribute name; `title` sits on the reserved word list.
#[derive(Debug, Default, PartialEq)]
struct FilterExpression {
    expression: Option<String>,
    names: Vec<(&'static str, &'static str)>,
    values: Vec<(&'static str, AttributeValue)>,
}

fn filter_expression(filter: &TaskFilter) -> FilterExpression {
    let mut parts = FilterExpression::default();
    let mut conditions: Vec<&str> = Vec::new();

    if let Some(title) = &filter.title {
        conditions.push("contains(#title_lc, :title)");
        parts.names.push(("#title_lc", "title_lc"));
        parts
            .values
            .push((":title", AttributeValue::S(title.to_lowercase())));
    }
    if let Some(complete) = filter.complete {
        conditions.push("#complete = :complete");
        parts.names.push(("#complete", "complete"));
        parts
            .values
            .push((":complete", AttributeValue::Bool(complete)));
    }

    if !conditions.is_empty() {
        parts.expression = Some(conditions.join(" AND "));
    }
    parts
}

fn item_to_task(item: &HashMap<String, AttributeValue>) -> Result<Task, StoreError> {
    let id = TaskId::parse(string_attr(item, "id")?)
        .map_err(|e| StoreError::Malformed(e.to_string()))?;
    let title = string_attr(item, "title")?.to_string();
    let description = match item.get("description") {
        Some(value) => Some(
            value
                .as_s()
                .map_err(|_| malformed_attr("description"))?
                .clone(),
        ),
        None => None,
    };
    let complete = *item
        .get("complete")
        .and_then(|value| value.as_bool().ok())
        .ok_or_else(|| malformed_attr("complete"))?;
    let created_at = datetime_attr(item, "created_at")?;
    let updated_at = datetime_attr(item, "updated_at")?;

    Ok(Task {
        id,
        title,
        description,
        complete,
        created_at,
        updated_at,
    })
}

fn string_attr<'a>(
    item: &'a HashMap<String, AttributeValue>,
    name: &str,
) -> Result<&'a str, StoreError> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| malformed_attr(name))
}

fn datetime_attr(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<DateTime<Utc>, StoreError> {
    let raw = string_attr(item, name)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Malformed(format!("attribute `{name}` is not a timestamp")))
}

fn malformed_attr(name: &str) -> StoreError {
    StoreError::Malformed(format!("missing or mistyped attribute `{name}`"))
}
