// ABOUTME: Transactional task board operations over the storage layer
// ABOUTME: One operation = one transaction; cache invalidation strictly after commit

use std::sync::Arc;

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use taskboard_core::utils::{generate_bucket_id, generate_history_id, generate_task_id};
use taskboard_core::validation::validate_name;
use taskboard_storage::{buckets, history, tasks, StorageError};
use taskboard_storage::{Bucket, ChangeType, HistoryEntry, Task};

use crate::cache::{ViewCache, ViewKey};
use crate::chain::Chain;
use crate::error::{corrupt, BoardError};
use crate::notify::{AssignmentNotifier, LogNotifier};

/// The task board service.
///
/// Orchestrates every user-facing mutation of the board as a single atomic
/// unit: load affected records, recompute the chain linkage, persist the
/// mutated records and the audit row in one transaction, then invalidate
/// the touched views.
pub struct TaskBoard {
    pool: SqlitePool,
    cache: ViewCache,
    notifier: Arc<dyn AssignmentNotifier>,
}

impl TaskBoard {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_notifier(pool, Arc::new(LogNotifier))
    }

    pub fn with_notifier(pool: SqlitePool, notifier: Arc<dyn AssignmentNotifier>) -> Self {
        Self {
            pool,
            cache: ViewCache::new(),
            notifier,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a bucket (board column)
    pub async fn create_bucket(&self, name: &str) -> Result<Bucket, BoardError> {
        validate_name("bucket name", name)
            .map_err(|e| BoardError::InvalidName(e.message))?;

        let mut tx = self.begin().await?;

        if buckets::find_by_name(&mut tx, name).await?.is_some() {
            return Err(BoardError::DuplicateBucket(name.to_string()));
        }

        let bucket = Bucket {
            id: generate_bucket_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        buckets::insert(&mut tx, &bucket).await?;

        commit(tx).await?;

        info!("Created bucket '{}' ({})", bucket.name, bucket.id);
        Ok(bucket)
    }

    /// All buckets, oldest first
    pub async fn buckets(&self) -> Result<Vec<Bucket>, BoardError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        Ok(buckets::all(&mut conn).await?)
    }

    /// Create a task appended at the tail of a bucket
    pub async fn create_task(&self, bucket_id: &str, name: &str) -> Result<Task, BoardError> {
        validate_name("task name", name).map_err(|e| BoardError::InvalidName(e.message))?;

        let mut tx = self.begin().await?;

        let bucket = buckets::find_by_id(&mut tx, bucket_id)
            .await?
            .ok_or_else(|| BoardError::BucketNotFound(bucket_id.to_string()))?;

        if tasks::name_exists_in_bucket(&mut tx, bucket_id, name, None).await? {
            return Err(BoardError::DuplicateName {
                name: name.to_string(),
                bucket: bucket.name,
            });
        }

        let mut chain = load_chain(&mut tx, bucket_id).await?;

        let now = Utc::now();
        let task = Task {
            id: generate_task_id(),
            bucket_id: bucket_id.to_string(),
            name: name.to_string(),
            left_id: None,
            right_id: None,
            assigned_user: None,
            created_at: now,
            updated_at: now,
        };
        let task_id = task.id.clone();

        chain.adopt(task)?;
        chain.append(&task_id)?;

        let created = chain
            .get(&task_id)
            .cloned()
            .ok_or_else(|| corrupt(format!("freshly appended task {} is missing", task_id)))?;

        // The new row must exist before the old tail's right link points at it
        tasks::insert(&mut tx, &created).await?;
        for record in chain.dirty_tasks() {
            if record.id != task_id {
                tasks::save(&mut tx, record).await?;
            }
        }

        commit(tx).await?;
        self.cache.invalidate(&ViewKey::Bucket(bucket_id.to_string()));

        info!("Created task '{}' ({}) in bucket {}", name, task_id, bucket_id);
        Ok(created)
    }

    /// Move a task directly after `new_left`, or to the head of its bucket
    /// when `new_left` is `None`. Never crosses buckets.
    pub async fn change_task_position(
        &self,
        task_id: &str,
        new_left: Option<&str>,
        actor: &str,
    ) -> Result<Task, BoardError> {
        let mut tx = self.begin().await?;

        let task = tasks::find_by_id(&mut tx, task_id)
            .await?
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        let old_left = task.left_id.clone();
        if old_left.as_deref() == new_left {
            debug!("Task {} already sits after {:?}, nothing to move", task_id, new_left);
            return Ok(task);
        }

        if let Some(left_id) = new_left {
            if left_id == task_id {
                return Err(BoardError::SelfReference);
            }
            let left = tasks::find_by_id(&mut tx, left_id)
                .await?
                .ok_or_else(|| BoardError::TaskNotFound(left_id.to_string()))?;
            if left.bucket_id != task.bucket_id {
                return Err(BoardError::CrossBucketPosition);
            }
        }

        let mut chain = load_chain(&mut tx, &task.bucket_id).await?;
        chain.detach(task_id)?;
        chain.insert_after(task_id, new_left)?;

        for record in chain.dirty_tasks() {
            tasks::save(&mut tx, record).await?;
        }

        let entry = HistoryEntry {
            id: generate_history_id(),
            task_id: task_id.to_string(),
            username: actor.to_string(),
            change_type: ChangeType::Edit,
            field_name: Some("task position".to_string()),
            old_value: old_left,
            new_value: new_left.map(String::from),
            recorded_at: Utc::now(),
        };
        history::record(&mut tx, &entry).await?;

        let moved = chain
            .get(task_id)
            .cloned()
            .ok_or_else(|| corrupt(format!("repositioned task {} is missing", task_id)))?;

        commit(tx).await?;
        self.cache
            .invalidate(&ViewKey::Bucket(task.bucket_id.clone()));

        info!(
            "Moved task {} after {:?} in bucket {}",
            task_id, new_left, task.bucket_id
        );
        Ok(moved)
    }

    /// Move a task to another bucket, appending it at that bucket's tail
    pub async fn change_task_bucket(
        &self,
        task_id: &str,
        new_bucket_id: &str,
        actor: &str,
    ) -> Result<Task, BoardError> {
        let mut tx = self.begin().await?;

        let task = tasks::find_by_id(&mut tx, task_id)
            .await?
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        let target = buckets::find_by_id(&mut tx, new_bucket_id)
            .await?
            .ok_or_else(|| BoardError::BucketNotFound(new_bucket_id.to_string()))?;

        let source = buckets::find_by_id(&mut tx, &task.bucket_id)
            .await?
            .ok_or_else(|| {
                corrupt(format!(
                    "task {} references missing bucket {}",
                    task_id, task.bucket_id
                ))
            })?;

        if tasks::name_exists_in_bucket(&mut tx, new_bucket_id, &task.name, None).await? {
            return Err(BoardError::DuplicateName {
                name: task.name.clone(),
                bucket: target.name,
            });
        }

        let mut source_chain = load_chain(&mut tx, &task.bucket_id).await?;
        source_chain.detach(task_id)?;
        let detached = source_chain.remove(task_id)?;

        let mut dest_chain = load_chain(&mut tx, new_bucket_id).await?;
        dest_chain.adopt(detached)?;
        dest_chain.append(task_id)?;

        for record in source_chain.dirty_tasks() {
            tasks::save(&mut tx, record).await?;
        }
        for record in dest_chain.dirty_tasks() {
            tasks::save(&mut tx, record).await?;
        }

        let entry = HistoryEntry {
            id: generate_history_id(),
            task_id: task_id.to_string(),
            username: actor.to_string(),
            change_type: ChangeType::Edit,
            field_name: Some("task state".to_string()),
            old_value: Some(source.name.clone()),
            new_value: Some(target.name.clone()),
            recorded_at: Utc::now(),
        };
        history::record(&mut tx, &entry).await?;

        let moved = dest_chain
            .get(task_id)
            .cloned()
            .ok_or_else(|| corrupt(format!("moved task {} is missing", task_id)))?;

        commit(tx).await?;
        self.cache
            .invalidate(&ViewKey::Bucket(task.bucket_id.clone()));
        self.cache
            .invalidate(&ViewKey::Bucket(new_bucket_id.to_string()));
        if let Some(assignee) = &task.assigned_user {
            self.cache.invalidate(&ViewKey::Assignee(assignee.clone()));
        }

        info!(
            "Moved task {} from bucket {} to bucket {}",
            task_id, task.bucket_id, new_bucket_id
        );
        Ok(moved)
    }

    /// Rename a task within its bucket
    pub async fn rename_task(
        &self,
        task_id: &str,
        new_name: &str,
        actor: &str,
    ) -> Result<Task, BoardError> {
        validate_name("task name", new_name)
            .map_err(|e| BoardError::InvalidName(e.message))?;

        let mut tx = self.begin().await?;

        let mut task = tasks::find_by_id(&mut tx, task_id)
            .await?
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        if tasks::name_exists_in_bucket(&mut tx, &task.bucket_id, new_name, Some(task_id))
            .await?
        {
            let bucket = buckets::find_by_id(&mut tx, &task.bucket_id)
                .await?
                .map(|b| b.name)
                .unwrap_or_else(|| task.bucket_id.clone());
            return Err(BoardError::DuplicateName {
                name: new_name.to_string(),
                bucket,
            });
        }

        let old_name = task.name.clone();
        task.name = new_name.to_string();
        tasks::save(&mut tx, &task).await?;

        let entry = HistoryEntry {
            id: generate_history_id(),
            task_id: task_id.to_string(),
            username: actor.to_string(),
            change_type: ChangeType::Edit,
            field_name: Some("name".to_string()),
            old_value: Some(old_name),
            new_value: Some(new_name.to_string()),
            recorded_at: Utc::now(),
        };
        history::record(&mut tx, &entry).await?;

        commit(tx).await?;
        self.cache
            .invalidate(&ViewKey::Bucket(task.bucket_id.clone()));
        if let Some(assignee) = &task.assigned_user {
            self.cache.invalidate(&ViewKey::Assignee(assignee.clone()));
        }

        info!("Renamed task {} to '{}'", task_id, new_name);
        Ok(task)
    }

    /// Delete a task, repairing its neighbors' links
    pub async fn delete_task(&self, task_id: &str, actor: &str) -> Result<(), BoardError> {
        warn!("Deleting task: {}", task_id);

        let mut tx = self.begin().await?;

        let task = tasks::find_by_id(&mut tx, task_id)
            .await?
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        let mut chain = load_chain(&mut tx, &task.bucket_id).await?;
        chain.detach(task_id)?;

        for record in chain.dirty_tasks() {
            if record.id != task_id {
                tasks::save(&mut tx, record).await?;
            }
        }

        let entry = HistoryEntry {
            id: generate_history_id(),
            task_id: task_id.to_string(),
            username: actor.to_string(),
            change_type: ChangeType::Delete,
            field_name: None,
            old_value: Some(task.name.clone()),
            new_value: None,
            recorded_at: Utc::now(),
        };
        history::record(&mut tx, &entry).await?;

        tasks::delete(&mut tx, task_id).await?;

        commit(tx).await?;
        self.cache
            .invalidate(&ViewKey::Bucket(task.bucket_id.clone()));
        if let Some(assignee) = &task.assigned_user {
            self.cache.invalidate(&ViewKey::Assignee(assignee.clone()));
        }

        Ok(())
    }

    /// Assign a task to a user and notify them
    pub async fn assign_task(
        &self,
        task_id: &str,
        username: &str,
        actor: &str,
    ) -> Result<Task, BoardError> {
        if username.trim().is_empty() {
            return Err(BoardError::BlankAssignee);
        }

        let mut tx = self.begin().await?;

        let mut task = tasks::find_by_id(&mut tx, task_id)
            .await?
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        // A task that was never assigned has no prior assignee to record
        let previous = task.assigned_user.clone();
        task.assigned_user = Some(username.to_string());
        tasks::save(&mut tx, &task).await?;

        let entry = HistoryEntry {
            id: generate_history_id(),
            task_id: task_id.to_string(),
            username: actor.to_string(),
            change_type: ChangeType::Edit,
            field_name: Some("assigned user".to_string()),
            old_value: previous,
            new_value: Some(username.to_string()),
            recorded_at: Utc::now(),
        };
        history::record(&mut tx, &entry).await?;

        commit(tx).await?;

        // Assignment reshapes per-user views beyond the ones we can name
        self.cache.clear();

        self.notifier.task_assigned(username, &task.name).await;

        info!("Assigned task {} to user: {}", task_id, username);
        Ok(task)
    }

    /// The ordered tasks of a bucket, head to tail (cached)
    pub async fn tasks_in_bucket(&self, bucket_id: &str) -> Result<Vec<Task>, BoardError> {
        let key = ViewKey::Bucket(bucket_id.to_string());
        if let Some(view) = self.cache.get(&key) {
            debug!("Serving bucket {} from cache", bucket_id);
            return Ok(view);
        }

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        buckets::find_by_id(&mut conn, bucket_id)
            .await?
            .ok_or_else(|| BoardError::BucketNotFound(bucket_id.to_string()))?;

        let chain = Chain::new(bucket_id, tasks::in_bucket(&mut conn, bucket_id).await?)?;
        let view: Vec<Task> = chain.ordered()?.into_iter().cloned().collect();

        self.cache.put(key, view.clone());
        Ok(view)
    }

    /// The tasks assigned to a user (cached)
    pub async fn assigned_tasks(&self, username: &str) -> Result<Vec<Task>, BoardError> {
        let key = ViewKey::Assignee(username.to_string());
        if let Some(view) = self.cache.get(&key) {
            debug!("Serving assignee {} from cache", username);
            return Ok(view);
        }

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        let view = tasks::find_by_assignee(&mut conn, username).await?;

        self.cache.put(key, view.clone());
        Ok(view)
    }

    /// A task's audit rows, newest first
    pub async fn task_history(&self, task_id: &str) -> Result<Vec<HistoryEntry>, BoardError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        tasks::find_by_id(&mut conn, task_id)
            .await?
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        Ok(history::for_task(&mut conn, task_id).await?)
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, BoardError> {
        self.pool
            .begin()
            .await
            .map_err(|e| BoardError::from(StorageError::Sqlx(e)))
    }
}

async fn commit(tx: Transaction<'static, Sqlite>) -> Result<(), BoardError> {
    tx.commit()
        .await
        .map_err(|e| BoardError::from(StorageError::Sqlx(e)))
}

async fn load_chain(
    tx: &mut Transaction<'static, Sqlite>,
    bucket_id: &str,
) -> Result<Chain, BoardError> {
    let records = tasks::in_bucket(tx, bucket_id).await?;
    Chain::new(bucket_id, records)
}
