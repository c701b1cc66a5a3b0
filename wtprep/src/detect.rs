//! Ecosystem detection against a live directory.

use std::path::Path;

use tracing::debug;

use crate::core::ecosystem::{ProjectEcosystem, classify};

/// Classify `dir` by the marker files present right now.
///
/// Nothing is cached: the provisioner calls this before installing and again
/// before verifying, and the second call must see what the install produced.
pub fn detect(dir: &Path) -> ProjectEcosystem {
    let ecosystem = classify(|marker| dir.join(marker).exists());
    debug!(dir = %dir.display(), %ecosystem, "detected ecosystem");
    ecosystem
}

/// True if `marker` exists in `dir`.
pub fn has_marker(dir: &Path, marker: &str) -> bool {
    dir.join(marker).exists()
}
