// ABOUTME: List invariant engine for a bucket's doubly-linked task chain
// ABOUTME: Pure splice/insert/detach over an id-keyed arena of loaded records

use std::collections::{BTreeSet, HashMap};

use taskboard_storage::Task;

use crate::error::{corrupt, BoardError};

/// One bucket's loaded task records plus the ids mutated since loading.
///
/// Records reference each other by id only; every operation is a lookup in
/// the arena, never a pointer chase. Callers persist exactly the records
/// reported by [`Chain::dirty_tasks`].
pub struct Chain {
    bucket_id: String,
    tasks: HashMap<String, Task>,
    dirty: BTreeSet<String>,
}

impl Chain {
    /// Build a chain from a bucket's loaded records.
    ///
    /// Rejects records belonging to another bucket — the store must never
    /// hand us a cross-bucket row.
    pub fn new(bucket_id: &str, records: Vec<Task>) -> Result<Self, BoardError> {
        let mut tasks = HashMap::with_capacity(records.len());
        for record in records {
            if record.bucket_id != bucket_id {
                return Err(corrupt(format!(
                    "task {} belongs to bucket {} but was loaded for bucket {}",
                    record.id, record.bucket_id, bucket_id
                )));
            }
            tasks.insert(record.id.clone(), record);
        }

        Ok(Self {
            bucket_id: bucket_id.to_string(),
            tasks,
            dirty: BTreeSet::new(),
        })
    }

    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    /// The records mutated since loading, in deterministic id order
    pub fn dirty_tasks(&self) -> Vec<&Task> {
        self.dirty
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect()
    }

    /// Splice a task out of the chain, repairing its neighbors' links.
    ///
    /// The task keeps its arena slot with both links cleared; the former
    /// neighbors (if any) become dirty alongside it.
    pub fn detach(&mut self, task_id: &str) -> Result<(), BoardError> {
        let task = self.expect_loaded(task_id)?;
        let left = task.left_id.clone();
        let right = task.right_id.clone();

        // Neighbor links must agree with the task before we rewire them
        if let Some(left_id) = &left {
            let neighbor = self.expect_loaded(left_id)?;
            if neighbor.right_id.as_deref() != Some(task_id) {
                return Err(corrupt(format!(
                    "asymmetric link: {} does not point back to {}",
                    left_id, task_id
                )));
            }
        }
        if let Some(right_id) = &right {
            let neighbor = self.expect_loaded(right_id)?;
            if neighbor.left_id.as_deref() != Some(task_id) {
                return Err(corrupt(format!(
                    "asymmetric link: {} does not point back to {}",
                    right_id, task_id
                )));
            }
        }

        if let Some(left_id) = &left {
            if let Some(neighbor) = self.tasks.get_mut(left_id) {
                neighbor.right_id = right.clone();
                self.dirty.insert(left_id.clone());
            }
        }
        if let Some(right_id) = &right {
            if let Some(neighbor) = self.tasks.get_mut(right_id) {
                neighbor.left_id = left.clone();
                self.dirty.insert(right_id.clone());
            }
        }
        if let Some(task) = self.tasks.get_mut(task_id) {
            task.left_id = None;
            task.right_id = None;
        }
        self.dirty.insert(task_id.to_string());

        Ok(())
    }

    /// Place a detached task immediately after `anchor`, or at the head of
    /// the chain when `anchor` is `None`.
    ///
    /// "No anchor" always means "become the new head", never the tail;
    /// callers wanting an append must pass the current tail as anchor.
    pub fn insert_after(
        &mut self,
        task_id: &str,
        anchor: Option<&str>,
    ) -> Result<(), BoardError> {
        let task = self.expect_loaded(task_id)?;
        if task.left_id.is_some() || task.right_id.is_some() {
            return Err(corrupt(format!(
                "task {} must be detached before insertion",
                task_id
            )));
        }

        let right = match anchor {
            Some(anchor_id) => {
                if anchor_id == task_id {
                    return Err(corrupt(format!(
                        "task {} cannot anchor its own insertion",
                        task_id
                    )));
                }
                self.expect_loaded(anchor_id)?.right_id.clone()
            }
            // The detached task is excluded from the head scan: it is not
            // part of the chain until this insertion completes.
            None => self.scan_head(Some(task_id))?.map(|t| t.id.clone()),
        };

        if right.as_deref() == Some(task_id) {
            return Err(corrupt(format!(
                "task {} is still linked from the chain it left",
                task_id
            )));
        }

        if let Some(anchor_id) = anchor {
            if let Some(neighbor) = self.tasks.get_mut(anchor_id) {
                neighbor.right_id = Some(task_id.to_string());
                self.dirty.insert(anchor_id.to_string());
            }
        }
        if let Some(right_id) = &right {
            if let Some(neighbor) = self.tasks.get_mut(right_id) {
                neighbor.left_id = Some(task_id.to_string());
                self.dirty.insert(right_id.clone());
            }
        }
        if let Some(task) = self.tasks.get_mut(task_id) {
            task.left_id = anchor.map(String::from);
            task.right_id = right;
        }
        self.dirty.insert(task_id.to_string());

        Ok(())
    }

    /// Place a detached task at the tail of the chain
    pub fn append(&mut self, task_id: &str) -> Result<(), BoardError> {
        let tail = self.scan_tail(Some(task_id))?.map(|t| t.id.clone());
        self.insert_after(task_id, tail.as_deref())
    }

    /// The unique task with no left neighbor, if the chain is non-empty
    pub fn head(&self) -> Result<Option<&Task>, BoardError> {
        self.scan_head(None)
    }

    /// The unique task with no right neighbor, if the chain is non-empty
    pub fn tail(&self) -> Result<Option<&Task>, BoardError> {
        self.scan_tail(None)
    }

    /// Walk the chain from head to tail.
    ///
    /// Fails on cycles, dangling links, and unreachable records.
    pub fn ordered(&self) -> Result<Vec<&Task>, BoardError> {
        let mut out = Vec::with_capacity(self.tasks.len());
        let mut cursor = self.head()?;

        while let Some(task) = cursor {
            out.push(task);
            if out.len() > self.tasks.len() {
                return Err(corrupt(format!(
                    "cycle detected in bucket {}",
                    self.bucket_id
                )));
            }
            cursor = match &task.right_id {
                Some(right_id) => Some(self.expect_loaded(right_id)?),
                None => None,
            };
        }

        if out.len() != self.tasks.len() {
            return Err(corrupt(format!(
                "bucket {} has tasks unreachable from its head",
                self.bucket_id
            )));
        }

        Ok(out)
    }

    /// Take a detached task out of the arena (cross-bucket move support)
    pub fn remove(&mut self, task_id: &str) -> Result<Task, BoardError> {
        let task = self.expect_loaded(task_id)?;
        if task.left_id.is_some() || task.right_id.is_some() {
            return Err(corrupt(format!(
                "task {} must be detached before leaving bucket {}",
                task_id, self.bucket_id
            )));
        }
        self.dirty.remove(task_id);
        self.tasks
            .remove(task_id)
            .ok_or_else(|| corrupt(format!("task {} vanished from the arena", task_id)))
    }

    /// Bring a detached record into this chain's arena, rebinding its bucket.
    ///
    /// The record becomes dirty immediately: a bucket change must persist
    /// even before the record is spliced in.
    pub fn adopt(&mut self, mut task: Task) -> Result<(), BoardError> {
        if task.left_id.is_some() || task.right_id.is_some() {
            return Err(corrupt(format!(
                "task {} must be detached before joining bucket {}",
                task.id, self.bucket_id
            )));
        }
        if self.tasks.contains_key(&task.id) {
            return Err(corrupt(format!(
                "task {} is already loaded in bucket {}",
                task.id, self.bucket_id
            )));
        }

        task.bucket_id = self.bucket_id.clone();
        self.dirty.insert(task.id.clone());
        self.tasks.insert(task.id.clone(), task);

        Ok(())
    }

    /// Audit every chain invariant: link symmetry, unique head and tail,
    /// full reachability, no cycles.
    pub fn check(&self) -> Result<(), BoardError> {
        for task in self.tasks.values() {
            if let Some(left_id) = &task.left_id {
                let neighbor = self.expect_loaded(left_id)?;
                if neighbor.right_id.as_deref() != Some(task.id.as_str()) {
                    return Err(corrupt(format!(
                        "asymmetric link: {} does not point back to {}",
                        left_id, task.id
                    )));
                }
            }
            if let Some(right_id) = &task.right_id {
                let neighbor = self.expect_loaded(right_id)?;
                if neighbor.left_id.as_deref() != Some(task.id.as_str()) {
                    return Err(corrupt(format!(
                        "asymmetric link: {} does not point back to {}",
                        right_id, task.id
                    )));
                }
            }
        }

        self.ordered().map(|_| ())
    }

    fn expect_loaded(&self, task_id: &str) -> Result<&Task, BoardError> {
        self.tasks.get(task_id).ok_or_else(|| {
            corrupt(format!(
                "task {} is not loaded in bucket {}",
                task_id, self.bucket_id
            ))
        })
    }

    fn scan_head(&self, exclude: Option<&str>) -> Result<Option<&Task>, BoardError> {
        self.scan_end(exclude, |task| task.left_id.is_none(), "head")
    }

    fn scan_tail(&self, exclude: Option<&str>) -> Result<Option<&Task>, BoardError> {
        self.scan_end(exclude, |task| task.right_id.is_none(), "tail")
    }

    fn scan_end(
        &self,
        exclude: Option<&str>,
        is_end: impl Fn(&Task) -> bool,
        end_name: &str,
    ) -> Result<Option<&Task>, BoardError> {
        let mut found: Option<&Task> = None;
        let mut scanned = 0usize;

        for task in self.tasks.values() {
            if Some(task.id.as_str()) == exclude {
                continue;
            }
            scanned += 1;
            if is_end(task) {
                if found.is_some() {
                    return Err(corrupt(format!(
                        "bucket {} has more than one {} task",
                        self.bucket_id, end_name
                    )));
                }
                found = Some(task);
            }
        }

        if found.is_none() && scanned > 0 {
            return Err(corrupt(format!(
                "bucket {} has no {} task",
                self.bucket_id, end_name
            )));
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, left: Option<&str>, right: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            bucket_id: "bucket-1".to_string(),
            name: id.to_string(),
            left_id: left.map(String::from),
            right_id: right.map(String::from),
            assigned_user: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn chain_abc() -> Chain {
        Chain::new(
            "bucket-1",
            vec![
                record("a", None, Some("b")),
                record("b", Some("a"), Some("c")),
                record("c", Some("b"), None),
            ],
        )
        .unwrap()
    }

    fn order(chain: &Chain) -> Vec<String> {
        chain
            .ordered()
            .unwrap()
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    #[test]
    fn test_ordered_walks_links() {
        let chain = chain_abc();
        assert_eq!(order(&chain), ["a", "b", "c"]);
        assert_eq!(chain.head().unwrap().unwrap().id, "a");
        assert_eq!(chain.tail().unwrap().unwrap().id, "c");
    }

    #[test]
    fn test_empty_chain() {
        let chain = Chain::new("bucket-1", vec![]).unwrap();
        assert!(chain.head().unwrap().is_none());
        assert!(chain.tail().unwrap().is_none());
        assert!(order(&chain).is_empty());
        assert!(chain.check().is_ok());
    }

    #[test]
    fn test_detach_middle_repairs_neighbors() {
        let mut chain = chain_abc();
        chain.detach("b").unwrap();

        assert_eq!(chain.get("a").unwrap().right_id.as_deref(), Some("c"));
        assert_eq!(chain.get("c").unwrap().left_id.as_deref(), Some("a"));
        assert!(chain.get("b").unwrap().left_id.is_none());
        assert!(chain.get("b").unwrap().right_id.is_none());

        let dirty: Vec<&str> = chain.dirty_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(dirty, ["a", "b", "c"]);
    }

    #[test]
    fn test_detach_head_and_tail() {
        let mut chain = chain_abc();
        chain.detach("a").unwrap();
        assert!(chain.get("b").unwrap().left_id.is_none());

        chain.detach("c").unwrap();
        assert!(chain.get("b").unwrap().right_id.is_none());
    }

    #[test]
    fn test_detach_sole_task() {
        let mut chain = Chain::new("bucket-1", vec![record("a", None, None)]).unwrap();
        chain.detach("a").unwrap();
        assert!(chain.get("a").unwrap().left_id.is_none());
        let dirty: Vec<&str> = chain.dirty_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(dirty, ["a"]);
    }

    #[test]
    fn test_reinsert_at_head_after_detach() {
        let mut chain = chain_abc();
        chain.detach("c").unwrap();
        chain.insert_after("c", None).unwrap();

        assert_eq!(order(&chain), ["c", "a", "b"]);
        assert!(chain.check().is_ok());
    }

    #[test]
    fn test_insert_after_anchor() {
        let mut chain = chain_abc();
        chain.detach("a").unwrap();
        chain.insert_after("a", Some("b")).unwrap();

        assert_eq!(order(&chain), ["b", "a", "c"]);
        assert!(chain.check().is_ok());
    }

    #[test]
    fn test_append_after_detach() {
        let mut chain = chain_abc();
        chain.detach("a").unwrap();
        chain.append("a").unwrap();

        assert_eq!(order(&chain), ["b", "c", "a"]);
        assert!(chain.check().is_ok());
    }

    #[test]
    fn test_append_into_empty_chain() {
        let mut chain = Chain::new("bucket-1", vec![]).unwrap();
        chain.adopt(record("a", None, None)).unwrap();
        chain.append("a").unwrap();

        assert_eq!(order(&chain), ["a"]);
        assert!(chain.get("a").unwrap().left_id.is_none());
        assert!(chain.get("a").unwrap().right_id.is_none());
    }

    #[test]
    fn test_insert_requires_detached_task() {
        let mut chain = chain_abc();
        let err = chain.insert_after("b", None).unwrap_err();
        assert!(matches!(err, BoardError::Corrupt(_)));
    }

    #[test]
    fn test_remove_and_adopt_move_a_record() {
        let mut source = chain_abc();
        source.detach("b").unwrap();
        let moved = source.remove("b").unwrap();

        assert_eq!(order(&source), ["a", "c"]);
        let dirty: Vec<&str> = source.dirty_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(dirty, ["a", "c"]);

        let mut dest = Chain::new("bucket-2", vec![]).unwrap();
        dest.adopt(moved).unwrap();
        dest.append("b").unwrap();

        assert_eq!(dest.get("b").unwrap().bucket_id, "bucket-2");
        assert_eq!(order(&dest), ["b"]);
    }

    #[test]
    fn test_adopt_rejects_linked_record() {
        let mut chain = Chain::new("bucket-2", vec![]).unwrap();
        let err = chain.adopt(record("a", Some("x"), None)).unwrap_err();
        assert!(matches!(err, BoardError::Corrupt(_)));
    }

    #[test]
    fn test_new_rejects_cross_bucket_records() {
        let mut stray = record("a", None, None);
        stray.bucket_id = "bucket-9".to_string();
        assert!(Chain::new("bucket-1", vec![stray]).is_err());
    }

    #[test]
    fn test_two_heads_is_corrupt() {
        let chain = Chain::new(
            "bucket-1",
            vec![record("a", None, None), record("b", None, None)],
        )
        .unwrap();
        let err = chain.head().unwrap_err();
        assert!(matches!(err, BoardError::Corrupt(_)));
    }

    #[test]
    fn test_cycle_is_corrupt() {
        // a <-> b cycle with no head: symmetric links but unreachable ends
        let chain = Chain::new(
            "bucket-1",
            vec![
                record("a", Some("b"), Some("b")),
                record("b", Some("a"), Some("a")),
            ],
        )
        .unwrap();
        assert!(chain.head().is_err());
        assert!(chain.check().is_err());
    }

    #[test]
    fn test_asymmetric_links_fail_check() {
        let chain = Chain::new(
            "bucket-1",
            vec![
                record("a", None, Some("b")),
                record("b", None, None),
                record("c", Some("b"), None),
            ],
        )
        .unwrap();
        assert!(chain.check().is_err());
    }

    #[test]
    fn test_detach_refuses_asymmetric_neighbor() {
        let mut chain = Chain::new(
            "bucket-1",
            vec![record("a", None, Some("b")), record("b", None, None)],
        )
        .unwrap();
        // b does not acknowledge a as its left neighbor
        let err = chain.detach("a").unwrap_err();
        assert!(matches!(err, BoardError::Corrupt(_)));
    }
}
