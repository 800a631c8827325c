use std::io::ErrorKind;
use std::path::PathBuf;

use harvest_core::Record;

use super::{StoreBackend, StoreError};
use crate::persist::{AtomicFileWriter, PersistError};

/// The whole collection as one pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    writer: AtomicFileWriter,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(path.into()),
        }
    }
}

#[async_trait::async_trait]
impl StoreBackend for JsonFileBackend {
    fn describe(&self) -> String {
        self.writer.target().display().to_string()
    }

    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        let bytes = match tokio::fs::read(self.writer.target()).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.describe(),
                    source,
                })
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn persist(&self, all: &[Record], _changed: &[&Record]) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(all)?;
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || writer.write(&body))
            .await
            .map_err(|err| PersistError::Io(std::io::Error::other(err)))??;
        Ok(())
    }
}
