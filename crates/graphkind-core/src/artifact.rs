//! Persisted classifier/extractor pairs.
//!
//! # Layout
//!
//! An artifact directory holds two JSON files:
//!
//! - `extractor.json`: `{ format_version, schema, normalizer }`
//! - `classifier.json`: `{ format_version, family, trained_at,
//!   extractor_digest, model }`
//!
//! `extractor_digest` is the BLAKE3 digest of the exact `extractor.json`
//! bytes written alongside the classifier. [`ArtifactStore::load`] recomputes
//! it and refuses a classifier paired with any other extractor.
//!
//! # Writes
//!
//! Each file is written to a sibling `.tmp` path, flushed, then renamed over
//! the target. The extractor is renamed first, so a reader that sees the new
//! classifier also sees its extractor. Writers must hold the directory's
//! [`TrainLock`].
//!
//! A reader landing between the two renames sees the new extractor with the
//! old classifier. [`ArtifactStore::load`] treats a digest mismatch as that
//! window and reads the pair once more after [`RELOAD_RETRY_DELAY`]; a
//! mismatch that survives the second read is reported.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::ErrorCode;
use crate::features::GraphFeatureExtractor;
use crate::model::{ModelFamily, TrainedModel};

pub const FORMAT_VERSION: u32 = 1;
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const EXTRACTOR_FILE: &str = "extractor.json";
pub const LOCK_FILE: &str = ".train.lock";

/// Default wait for a competing trainer to release the lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause before [`ArtifactStore::load`] rereads a mismatched pair.
pub const RELOAD_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("{}: no artifact at {}", ErrorCode::ModelNotFound.code(), path.display())]
    NotFound { path: PathBuf },

    #[error("{}: I/O error at {}: {source}", ErrorCode::ArtifactWriteFailed.code(), path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: malformed artifact {}: {source}", ErrorCode::ArtifactMismatch.code(), path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "{}: {} has format version {found}, expected {}",
        ErrorCode::ArtifactMismatch.code(),
        path.display(),
        FORMAT_VERSION
    )]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error(
        "{}: classifier expects extractor {expected} but found {found}",
        ErrorCode::ArtifactMismatch.code()
    )]
    DigestMismatch { expected: String, found: String },

    #[error(
        "{}: model uses {model} features but the schema has {schema}",
        ErrorCode::SchemaMismatch.code()
    )]
    WidthMismatch { model: usize, schema: usize },

    #[error("{}: extractor has not been fitted", ErrorCode::NotFitted.code())]
    NotFitted,

    #[error(
        "{}: lock timed out after {waited:?} at {}",
        ErrorCode::LockContention.code(),
        path.display()
    )]
    LockTimeout { path: PathBuf, waited: Duration },
}

impl ArtifactError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ModelNotFound,
            Self::Io { .. } => ErrorCode::ArtifactWriteFailed,
            Self::Malformed { .. } | Self::UnsupportedVersion { .. } | Self::DigestMismatch { .. } => {
                ErrorCode::ArtifactMismatch
            }
            Self::WidthMismatch { .. } => ErrorCode::SchemaMismatch,
            Self::NotFitted => ErrorCode::NotFitted,
            Self::LockTimeout { .. } => ErrorCode::LockContention,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Training lock
// ---------------------------------------------------------------------------

/// Exclusive advisory lock on an artifact directory, released on drop.
#[derive(Debug)]
pub struct TrainLock {
    file: File,
    path: PathBuf,
}

impl TrainLock {
    /// Acquire the lock at `path`, retrying until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::LockTimeout`] when another holder keeps it, or an
    /// I/O error creating the lock file.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, ArtifactError> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| ArtifactError::io(parent, e))?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(|e| ArtifactError::io(path, e))?;

            if FileExt::try_lock_exclusive(&file).is_ok() {
                debug!(path = %path.display(), "acquired training lock");
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(ArtifactError::LockTimeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly. Dropping the guard does the same.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for TrainLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

// ---------------------------------------------------------------------------
// File formats
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct ExtractorFile {
    format_version: u32,
    #[serde(flatten)]
    extractor: GraphFeatureExtractor,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassifierFile {
    format_version: u32,
    family: ModelFamily,
    trained_at: DateTime<Utc>,
    extractor_digest: String,
    model: TrainedModel,
}

fn digest(bytes: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(bytes).to_hex())
}

/// A loaded, verified classifier with its extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBundle {
    pub extractor: GraphFeatureExtractor,
    pub model: TrainedModel,
    pub trained_at: DateTime<Utc>,
    pub extractor_digest: String,
}

impl ModelBundle {
    /// Pair a fitted extractor with a model trained on its output.
    ///
    /// # Errors
    ///
    /// Fails when the extractor is unfitted or the widths disagree.
    pub fn new(extractor: GraphFeatureExtractor, model: TrainedModel) -> Result<Self, ArtifactError> {
        check_pair(&extractor, &model)?;
        let bytes = extractor_bytes(&extractor)?;
        Ok(Self {
            extractor,
            model,
            trained_at: Utc::now(),
            extractor_digest: digest(&bytes),
        })
    }

    #[must_use]
    pub const fn family(&self) -> ModelFamily {
        self.model.family()
    }
}

fn check_pair(extractor: &GraphFeatureExtractor, model: &TrainedModel) -> Result<(), ArtifactError> {
    if !extractor.is_fitted() {
        return Err(ArtifactError::NotFitted);
    }
    if extractor.schema().len() != model.width() {
        return Err(ArtifactError::WidthMismatch {
            model: model.width(),
            schema: extractor.schema().len(),
        });
    }
    Ok(())
}

fn extractor_bytes(extractor: &GraphFeatureExtractor) -> Result<Vec<u8>, ArtifactError> {
    let file = ExtractorFile {
        format_version: FORMAT_VERSION,
        extractor: extractor.clone(),
    };
    serde_json::to_vec_pretty(&file).map_err(|source| ArtifactError::Malformed {
        path: PathBuf::from(EXTRACTOR_FILE),
        source,
    })
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Reads and writes the artifact pair in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn classifier_path(&self) -> PathBuf {
        self.dir.join(CLASSIFIER_FILE)
    }

    #[must_use]
    pub fn extractor_path(&self) -> PathBuf {
        self.dir.join(EXTRACTOR_FILE)
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Take the exclusive training lock for this directory.
    ///
    /// # Errors
    ///
    /// See [`TrainLock::acquire`].
    pub fn lock(&self, timeout: Duration) -> Result<TrainLock, ArtifactError> {
        TrainLock::acquire(&self.lock_path(), timeout)
    }

    /// Whether both artifact files are present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.classifier_path().is_file() && self.extractor_path().is_file()
    }

    /// Write the pair atomically, extractor first.
    ///
    /// The `_lock` argument proves the caller holds the training lock.
    ///
    /// # Errors
    ///
    /// Fails on an invalid pair or any I/O error.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn save(
        &self,
        _lock: &TrainLock,
        extractor: &GraphFeatureExtractor,
        model: &TrainedModel,
    ) -> Result<ModelBundle, ArtifactError> {
        check_pair(extractor, model)?;
        fs::create_dir_all(&self.dir).map_err(|e| ArtifactError::io(&self.dir, e))?;

        let extractor_bytes = extractor_bytes(extractor)?;
        let extractor_digest = digest(&extractor_bytes);
        let trained_at = Utc::now();

        let classifier = ClassifierFile {
            format_version: FORMAT_VERSION,
            family: model.family(),
            trained_at,
            extractor_digest: extractor_digest.clone(),
            model: model.clone(),
        };
        let classifier_bytes =
            serde_json::to_vec_pretty(&classifier).map_err(|source| ArtifactError::Malformed {
                path: self.classifier_path(),
                source,
            })?;

        write_atomic(&self.extractor_path(), &extractor_bytes)?;
        write_atomic(&self.classifier_path(), &classifier_bytes)?;
        info!(family = %model.family(), digest = %extractor_digest, "saved artifacts");

        Ok(ModelBundle {
            extractor: extractor.clone(),
            model: model.clone(),
            trained_at,
            extractor_digest,
        })
    }

    /// Load and verify the pair.
    ///
    /// A digest mismatch is retried once, since a concurrent save may sit
    /// between its two renames.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::NotFound`] when either file is missing, a mismatch
    /// error when the files do not belong together.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn load(&self) -> Result<ModelBundle, ArtifactError> {
        match self.load_once() {
            Err(ArtifactError::DigestMismatch { expected, found }) => {
                debug!(%expected, %found, "extractor and classifier disagree, reading again");
                thread::sleep(RELOAD_RETRY_DELAY);
                self.load_once()
            }
            other => other,
        }
    }

    fn load_once(&self) -> Result<ModelBundle, ArtifactError> {
        let classifier_path = self.classifier_path();
        let extractor_path = self.extractor_path();

        let classifier_bytes = fs::read(&classifier_path).map_err(|e| ArtifactError::io(&classifier_path, e))?;
        let extractor_bytes = fs::read(&extractor_path).map_err(|e| ArtifactError::io(&extractor_path, e))?;

        let classifier: ClassifierFile =
            serde_json::from_slice(&classifier_bytes).map_err(|source| ArtifactError::Malformed {
                path: classifier_path.clone(),
                source,
            })?;
        if classifier.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                path: classifier_path,
                found: classifier.format_version,
            });
        }

        let found = digest(&extractor_bytes);
        if found != classifier.extractor_digest {
            return Err(ArtifactError::DigestMismatch {
                expected: classifier.extractor_digest,
                found,
            });
        }

        let extractor: ExtractorFile =
            serde_json::from_slice(&extractor_bytes).map_err(|source| ArtifactError::Malformed {
                path: extractor_path.clone(),
                source,
            })?;
        if extractor.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                path: extractor_path,
                found: extractor.format_version,
            });
        }
        check_pair(&extractor.extractor, &classifier.model)?;

        debug!(family = %classifier.family, "loaded artifacts");
        Ok(ModelBundle {
            extractor: extractor.extractor,
            model: classifier.model,
            trained_at: classifier.trained_at,
            extractor_digest: found,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let tmp_path = path.with_extension("json.tmp");
    let mut file = File::create(&tmp_path).map_err(|e| ArtifactError::io(&tmp_path, e))?;
    file.write_all(bytes).map_err(|e| ArtifactError::io(&tmp_path, e))?;
    file.sync_all().map_err(|e| ArtifactError::io(&tmp_path, e))?;
    drop(file);
    fs::rename(&tmp_path, path).map_err(|e| ArtifactError::io(path, e))
}
