use crate::{audit::Finding, backend::BackendRef};
use std::io;

/// Receives audit progress as it happens.
pub trait Report {
    /// The number of ingress resources discovered.
    fn ingresses(&mut self, count: usize) -> io::Result<()>;

    /// The number of backends remaining after deduplication.
    fn candidates(&mut self, count: usize) -> io::Result<()>;

    /// The backend's service no longer exists.
    fn not_found(&mut self, backend: &BackendRef) -> io::Result<()>;

    /// The backend's service is an `ExternalName` alias.
    fn external_name(&mut self, backend: &BackendRef) -> io::Result<()>;

    /// No pods matched the backend's selector, so it was not audited.
    fn no_pods(&mut self, backend: &BackendRef) -> io::Result<()>;

    fn finding(&mut self, backend: &BackendRef, finding: &Finding) -> io::Result<()>;

    /// All of the backend's findings have been reported.
    fn audited(&mut self, backend: &BackendRef) -> io::Result<()>;
}

/// Writes a line-oriented, human-readable report.
#[derive(Debug)]
pub struct TextReport<W> {
    out: W,
}

// === impl TextReport ===

impl<W: io::Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TextReport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: io::Write> Report for TextReport<W> {
    fn ingresses(&mut self, count: usize) -> io::Result<()> {
        writeln!(self.out, "Found {count} ingress resources")
    }

    fn candidates(&mut self, count: usize) -> io::Result<()> {
        writeln!(self.out, "{count} results (after filtering)")
    }

    fn not_found(&mut self, backend: &BackendRef) -> io::Result<()> {
        writeln!(self.out, "Not found service: {}", backend.service)
    }

    fn external_name(&mut self, _: &BackendRef) -> io::Result<()> {
        Ok(())
    }

    fn no_pods(&mut self, backend: &BackendRef) -> io::Result<()> {
        writeln!(
            self.out,
            "No active pods found for {}, skipping",
            backend.source_name()
        )
    }

    fn finding(&mut self, backend: &BackendRef, finding: &Finding) -> io::Result<()> {
        match finding.container.as_deref() {
            None => writeln!(
                self.out,
                "{} for service {} (pod: {})",
                finding.property, backend.service, finding.pod
            ),
            Some(container) => writeln!(
                self.out,
                "{} for service {} (pod: {}, container: {})",
                finding.property, backend.service, finding.pod, container
            ),
        }
    }

    fn audited(&mut self, _: &BackendRef) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }
}
