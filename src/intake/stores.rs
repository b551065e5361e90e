// External collaborators of the upload cascade.
//
// The cascade only needs narrow operations from them, and treats every
// failure as a degraded outcome rather than an error.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use crate::intake::*;

/// Keeps the raw uploaded documents, by key.
pub trait ObjectStore: Send + Sync {
    fn put(&self, bytes: &[u8], key: &str, content_type: &str) -> IntakeResult<()>;
    /// `Ok(None)` when there is no object under this key.
    fn get(&self, key: &str) -> IntakeResult<Option<Vec<u8>>>;
}

/// Keeps the normalized records.
pub trait RecordStore: Send + Sync {
    fn put_record(&self, record: &CanonicalEventRecord, event_id: &str) -> IntakeResult<()>;
}

pub trait AlertChannel: Send + Sync {
    fn publish(&self, message: &str) -> IntakeResult<()>;
}

/// Objects as plain files in a directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: PathBuf) -> FsObjectStore {
        FsObjectStore { root }
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bytes: &[u8], key: &str, content_type: &str) -> IntakeResult<()> {
        fs::create_dir_all(&self.root).context(WritingObjectSnafu { key })?;
        let path = self.root.join(key);
        fs::write(&path, bytes).context(WritingObjectSnafu { key })?;
        debug!("put: {:?} ({}) -> {:?}", key, content_type, path);
        Ok(())
    }

    fn get(&self, key: &str) -> IntakeResult<Option<Vec<u8>>> {
        match fs::read(self.root.join(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(source) => Err(IntakeError::ReadingObject {
                source,
                key: key.to_string(),
            }),
        }
    }
}

/// Records as pretty-printed JSON files, one per event.
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    pub fn new(root: PathBuf) -> FsRecordStore {
        FsRecordStore { root }
    }
}

impl RecordStore for FsRecordStore {
    fn put_record(&self, record: &CanonicalEventRecord, event_id: &str) -> IntakeResult<()> {
        let js = serde_json::to_string_pretty(record).context(SerializingRecordSnafu {})?;
        fs::create_dir_all(&self.root).context(WritingRecordSnafu { event_id })?;
        fs::write(self.root.join(format!("{}.json", event_id)), js)
            .context(WritingRecordSnafu { event_id })?;
        Ok(())
    }
}

/// Publishes alerts to the log, under a topic.
pub struct LogAlertChannel {
    topic: Option<String>,
    subject: String,
}

impl LogAlertChannel {
    pub fn new(topic: Option<String>, subject: String) -> LogAlertChannel {
        LogAlertChannel { topic, subject }
    }
}

impl AlertChannel for LogAlertChannel {
    fn publish(&self, message: &str) -> IntakeResult<()> {
        let topic = self.topic.as_ref().context(AlertTopicMissingSnafu {})?;
        info!("[{}] {}: {}", topic, self.subject, message);
        Ok(())
    }
}

/// Stands in for a store that has not been configured: every call fails.
pub struct DisabledStore {}

impl ObjectStore for DisabledStore {
    fn put(&self, _bytes: &[u8], _key: &str, _content_type: &str) -> IntakeResult<()> {
        StorageDisabledSnafu {}.fail()
    }

    fn get(&self, _key: &str) -> IntakeResult<Option<Vec<u8>>> {
        StorageDisabledSnafu {}.fail()
    }
}

impl RecordStore for DisabledStore {
    fn put_record(&self, _record: &CanonicalEventRecord, _event_id: &str) -> IntakeResult<()> {
        StorageDisabledSnafu {}.fail()
    }
}
