// ============================
// students-backend-lib/src/storage/flat_file.rs
// ============================
//! Flat-file record store.
//!
//! Layout under the root directory:
//! - `students/<id>.json` holds one record
//! - `emails/<sha256(email)>` holds the id owning that email
//!
//! Email markers are created with `create_new`, so the filesystem rejects a
//! second claim on the same email even across processes. Records are written
//! to a temporary file and renamed into place, so readers only ever see a
//! complete old or complete new record.
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::{
    fmt::Write as _,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use students_common::{ProfileUpdate, Student};
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};
use tracing::warn;

use super::RecordStore;
use crate::error::AppError;

const RECORD_DIR: &str = "students";
const EMAIL_DIR: &str = "emails";

/// Flat-file implementation of the `RecordStore` trait
#[derive(Debug, Clone)]
pub struct FlatFileRecordStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileRecordStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(RECORD_DIR))?;
        fs::create_dir_all(root.join(EMAIL_DIR))?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(RECORD_DIR).join(format!("{id}.json"))
    }

    fn email_path(&self, email: &str) -> PathBuf {
        let digest = Sha256::digest(email.as_bytes());
        let mut name = String::with_capacity(64);
        for byte in digest {
            let _ = write!(name, "{byte:02x}");
        }
        self.root.join(EMAIL_DIR).join(name)
    }

    async fn read_record(&self, path: &Path) -> Result<Option<Student>, AppError> {
        match tokio_fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Write a record via temp file + rename
    async fn write_record(&self, student: &Student) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(student)?;
        let tmp = self.root.join(RECORD_DIR).join(format!(
            ".{}.{}.tmp",
            student.id,
            uuid::Uuid::new_v4().simple()
        ));

        let mut file = tokio_fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(err) = tokio_fs::rename(&tmp, self.record_path(&student.id)).await {
            let _ = tokio_fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }

    /// Claim the email marker, then write the record behind it.
    /// Runs to completion once started; see `insert`.
    async fn claim_and_write(&self, student: &Student) -> Result<(), AppError> {
        let marker = self.email_path(&student.email);

        let mut file = match tokio_fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&marker)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::DuplicateEmail)
            },
            Err(err) => return Err(err.into()),
        };

        let written: Result<(), AppError> = async {
            file.write_all(student.id.as_bytes()).await?;
            file.sync_all().await?;
            self.write_record(student).await
        }
        .await;

        // Release the email again if the record never made it to disk
        if let Err(err) = written {
            let _ = tokio_fs::remove_file(&marker).await;
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FlatFileRecordStore {
    async fn insert(&self, student: &Student) -> Result<(), AppError> {
        // Detached from the caller: a dropped request must not strand a marker
        let store = self.clone();
        let student = student.clone();
        tokio::spawn(async move { store.claim_and_write(&student).await })
            .await
            .map_err(AppError::internal)?
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Student>, AppError> {
        // Ids are uuids; anything that could escape the record directory cannot exist
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            return Ok(None);
        }
        self.read_record(&self.record_path(id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, AppError> {
        let id = match tokio_fs::read_to_string(self.email_path(email)).await {
            Ok(id) => id,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        // Guard against a digest collision or a stale marker
        Ok(self
            .find_by_id(id.trim())
            .await?
            .filter(|student| student.email == email))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(tokio_fs::try_exists(self.email_path(email)).await?)
    }

    async fn find_by_course(&self, course_id: &str) -> Result<Vec<Student>, AppError> {
        let mut students = Vec::new();
        let mut entries = tokio_fs::read_dir(self.root.join(RECORD_DIR)).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }
            // A record deleted mid-scan simply drops out
            match self.read_record(&path).await {
                Ok(Some(student)) if student.course_ids.contains(course_id) => {
                    students.push(student)
                },
                Ok(_) => {},
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable student record")
                },
            }
        }

        students.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(students)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Student>, AppError> {
        let _guard = self.write_lock.lock().await;

        let Some(mut student) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        student.apply(update);
        self.write_record(&student).await?;
        Ok(Some(student))
    }

    async fn delete(&self, id: &str) -> Result<Option<Student>, AppError> {
        let _guard = self.write_lock.lock().await;

        let Some(student) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        match tokio_fs::remove_file(self.record_path(id)).await {
            Ok(()) => {},
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        }
        match tokio_fs::remove_file(self.email_path(&student.email)).await {
            Ok(()) => {},
            Err(err) if err.kind() == ErrorKind::NotFound => {},
            Err(err) => return Err(err.into()),
        }

        Ok(Some(student))
    }
}
