use crate::errors::{AppError, AppResult};
use crate::models::{Subject, Task};
use crate::store::Store;

pub async fn list_subjects(store: &Store) -> AppResult<Vec<Subject>> {
    store.get_all().await
}

pub async fn list_tasks(store: &Store) -> AppResult<Vec<Task>> {
    store.get_all().await
}

pub async fn list_tasks_for_subject(store: &Store, subject_id: i64) -> AppResult<Vec<Task>> {
    store.get_by_index("subjectId", subject_id).await
}

pub async fn find_subject(store: &Store, subject_id: i64) -> AppResult<Option<Subject>> {
    let subjects = list_subjects(store).await?;
    Ok(subjects.into_iter().find(|s| s.id == Some(subject_id)))
}

pub async fn find_task(store: &Store, task_id: i64) -> AppResult<Task> {
    let tasks = list_tasks(store).await?;
    tasks
        .into_iter()
        .find(|t| t.id == Some(task_id))
        .ok_or_else(|| AppError::NotFound(format!("task {}", task_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn seeded_store(dir: &tempfile::TempDir) -> Store {
        let store = Store::open(&dir.path().join("db.sqlite3"), 1).await.unwrap();
        for name in ["Math", "Biology"] {
            let subject = Subject {
                id: None,
                name: name.to_string(),
                teacher: None,
                notes: None,
            };
            store.put(&subject).await.unwrap();
        }
        let deadline = NaiveDate::from_ymd_opt(2026, 10, 21)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        for (title, subject_id) in [("HW1", 1), ("Lab", 2), ("HW2", 1), ("Orphan", 42)] {
            store.put(&Task::new(title, subject_id, deadline)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_tasks_for_subject_match_full_scan() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(&dir).await;
        let all = list_tasks(&store).await.unwrap();

        for subject_id in [1, 2, 3, 42] {
            let mut by_index = list_tasks_for_subject(&store, subject_id).await.unwrap();
            let mut by_scan: Vec<Task> = all
                .iter()
                .filter(|t| t.subject_id == subject_id)
                .cloned()
                .collect();
            by_index.sort_by_key(|t| t.id);
            by_scan.sort_by_key(|t| t.id);
            assert_eq!(by_index, by_scan, "subject {}", subject_id);
        }
    }

    #[tokio::test]
    async fn test_find_helpers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(&dir).await;

        let subject = find_subject(&store, 2).await.unwrap().expect("subject 2");
        assert_eq!(subject.name, "Biology");
        assert!(find_subject(&store, 99).await.unwrap().is_none());

        assert_eq!(find_task(&store, 3).await.unwrap().title, "HW2");
        let err = find_task(&store, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
