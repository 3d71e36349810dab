use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::error::Result;
use crate::sink::{Fingerprint, FingerprintKind, Sink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Registered as ingested; go ahead and decode
    Proceed(Fingerprint),
    /// Seen before, skip without decoding
    AlreadyIngested(Fingerprint),
}

/// Best-effort per-file deduplication against the sink.
///
/// Check and registration are two separate round trips, so two workers can
/// both be admitted for the same file. The sink stays the only record of
/// what has been seen.
#[derive(Clone)]
pub struct AdmissionGate {
    sink: Arc<dyn Sink>,
    kind: FingerprintKind,
}

impl AdmissionGate {
    pub fn new(sink: Arc<dyn Sink>, kind: FingerprintKind) -> Self {
        Self { sink, kind }
    }

    pub async fn admit(&self, path: &Path) -> Result<Admission> {
        let fingerprint = self.fingerprint(path.to_path_buf()).await?;

        let mut connection = self.sink.connect().await?;
        if connection.has_already_ingested(&fingerprint).await? {
            debug!("{:?} already ingested as {}", path, fingerprint);
            return Ok(Admission::AlreadyIngested(fingerprint));
        }

        connection.record_ingested(&fingerprint).await?;

        Ok(Admission::Proceed(fingerprint))
    }

    async fn fingerprint(&self, path: PathBuf) -> Result<Fingerprint> {
        let kind = self.kind;
        let fingerprint = tokio::task::spawn_blocking(move || Fingerprint::compute(kind, &path)).await??;
        Ok(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use crate::sink::memory::MemorySink;

    #[tokio::test]
    async fn second_admission_is_refused() {
        let sink = MemorySink::new();
        let gate = AdmissionGate::new(Arc::new(sink.clone()), FingerprintKind::ContentHash);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"GRIB").unwrap();

        let first = gate.admit(file.path()).await.unwrap();
        let second = gate.admit(file.path()).await.unwrap();

        let fingerprint = match first {
            Admission::Proceed(fingerprint) => fingerprint,
            other => panic!("unexpected admission {:?}", other),
        };
        assert!(sink.is_ingested(&fingerprint));
        assert_eq!(second, Admission::AlreadyIngested(fingerprint));
    }

    #[tokio::test]
    async fn identical_content_under_another_name_is_a_duplicate() {
        let gate = AdmissionGate::new(Arc::new(MemorySink::new()), FingerprintKind::ContentHash);
        let mut a = NamedTempFile::new().unwrap();
        a.write_all(b"same bytes").unwrap();
        let mut b = NamedTempFile::new().unwrap();
        b.write_all(b"same bytes").unwrap();

        assert!(matches!(gate.admit(a.path()).await.unwrap(), Admission::Proceed(_)));
        assert!(matches!(gate.admit(b.path()).await.unwrap(), Admission::AlreadyIngested(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let gate = AdmissionGate::new(Arc::new(MemorySink::new()), FingerprintKind::ContentHash);

        assert!(gate.admit(Path::new("/nonexistent/file.grib2")).await.is_err());
    }
}
