use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use fold_train::ArtifactSink;

/// Errors that can occur while persisting a model artifact.
#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "artifact file error: {}", e),
            SinkError::Json(e) => write!(f, "artifact encoding error: {}", e),
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SinkError::Io(e) => Some(e),
            SinkError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::Io(e)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(e: serde_json::Error) -> Self {
        SinkError::Json(e)
    }
}

/// Persists model artifacts as `{prefix}_{fold}.json` files in a directory.
#[derive(Debug, Clone)]
pub struct JsonSink {
    dir: PathBuf,
    prefix: String,
}

impl JsonSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }
}

impl<M: Serialize> ArtifactSink<M> for JsonSink {
    type Error = SinkError;

    fn persist(&mut self, model: &M, fold: usize) -> Result<String, SinkError> {
        let name = format!("{}_{}.json", self.prefix, fold);
        let path = self.dir.join(&name);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), model)?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_writes_keyed_file() {
        let dir = std::env::temp_dir().join(format!("fold-runner-sink-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut sink = JsonSink::new(&dir, "model");
        let key = sink.persist(&vec![1.0, 2.0], 3).unwrap();
        assert!(key.ends_with("model_3.json"));

        let written = std::fs::read_to_string(dir.join("model_3.json")).unwrap();
        let restored: Vec<f64> = serde_json::from_str(&written).unwrap();
        assert_eq!(restored, vec![1.0, 2.0]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_persist_fails_on_missing_directory() {
        let dir = std::env::temp_dir().join("fold-runner-sink-does-not-exist");
        let mut sink = JsonSink::new(&dir, "model");
        let result = ArtifactSink::<Vec<f64>>::persist(&mut sink, &vec![1.0], 0);
        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
