use crate::store::{CollectionSchema, Record, SUBJECTS, TASKS};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBJECT_NAME: &str = "General";

// Subject struct
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Subject {
    #[serde(skip)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// Task struct, stored as a document in the `tasks` collection
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(skip)]
    pub id: Option<i64>,
    pub title: String,
    pub subject_id: i64,
    pub deadline: NaiveDateTime,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Task {
    pub fn new(title: impl Into<String>, subject_id: i64, deadline: NaiveDateTime) -> Task {
        Task {
            id: None,
            title: title.into(),
            subject_id,
            deadline,
            is_complete: false,
            completed_at: None,
            attachments: Vec::new(),
        }
    }

    /// Completion and its timestamp only ever change together.
    pub fn set_complete(&mut self, done: bool, now: DateTime<Utc>) {
        self.is_complete = done;
        self.completed_at = if done { Some(now) } else { None };
    }
}

// Attachment struct, the file bytes live inside the task document
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(with = "base64_blob")]
    pub blob: Vec<u8>,
}

impl Record for Subject {
    fn schema() -> &'static CollectionSchema {
        &SUBJECTS
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl Record for Task {
    fn schema() -> &'static CollectionSchema {
        &TASKS
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn index_value(&self, index: &str) -> Option<i64> {
        match index {
            "subjectId" => Some(self.subject_id),
            _ => None,
        }
    }
}

mod base64_blob {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
