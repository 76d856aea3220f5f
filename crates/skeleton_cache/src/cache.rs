//! Per-unit skeleton cache.
//!
//! Each tracked unit owns one [`SkeletonReferenceCache`]. It remembers the
//! dependent semantic version it last answered for and the artifact it last
//! adopted. A request at the same version is answered from that pair without
//! any work, including when the previous build failed: there is no retry until
//! the version moves. A request at a new version fetches the skeleton for the
//! unit's current compilation from the shared table, and when that yields
//! nothing, keeps serving the older artifact.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use skeleton_common::VersionStamp;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::artifact::SkeletonArtifact;
use crate::compilation::CompilationTracker;
use crate::error::{CacheError, CacheResult};
use crate::link::LinkProperties;
use crate::reference::SkeletonReference;
use crate::service::SkeletonService;

#[derive(Clone, Default)]
struct CacheState {
    version: VersionStamp,
    artifact: Option<Arc<SkeletonArtifact>>,
}

/// The (version, artifact) pair for one unit.
///
/// Cloning snapshots the pair into an independent cache; later changes to
/// either copy are not seen by the other.
#[derive(Default)]
pub struct SkeletonReferenceCache {
    state: Mutex<CacheState>,
}

impl SkeletonReferenceCache {
    /// Creates an empty cache at [`VersionStamp::DEFAULT`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The version of the last committed build, or `DEFAULT` if none.
    pub fn version(&self) -> VersionStamp {
        self.state.lock().version
    }

    /// Returns `true` if an artifact has been adopted.
    pub fn has_artifact(&self) -> bool {
        self.state.lock().artifact.is_some()
    }

    /// Returns the reference for `properties` from the stored artifact, without
    /// checking whether it is current.
    pub fn try_get_already_built_reference(
        &self,
        properties: &LinkProperties,
    ) -> Option<Arc<SkeletonReference>> {
        let artifact = self.state.lock().artifact.clone()?;
        Some(artifact.get_or_create_reference(properties))
    }

    /// Returns a reference for the unit's current version, building the
    /// skeleton through `service` if the version moved since the last call.
    ///
    /// The result may come from an older version when the newest build failed,
    /// and is `None` if no build for this unit has ever succeeded.
    pub async fn get_or_build_reference<T>(
        &self,
        tracker: &T,
        service: &SkeletonService,
        properties: &LinkProperties,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<Arc<SkeletonReference>>>
    where
        T: CompilationTracker,
    {
        let version = tracker.dependent_semantic_version(cancel).await?;
        debug_assert!(
            !version.is_default(),
            "dependent semantic version must not be the default stamp"
        );
        if version.is_default() {
            return Err(CacheError::UninitializedVersion);
        }

        {
            let state = self.state.lock();
            if state.version == version {
                debug!(%version, "skeleton cache hit");
                return Ok(state
                    .artifact
                    .as_ref()
                    .map(|artifact| artifact.get_or_create_reference(properties)));
            }
        }

        let compilation = tracker.compilation(cancel).await?;
        let built = service.fetch_or_build(&compilation, cancel).await?;
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }

        let artifact = {
            let mut state = self.state.lock();
            match built {
                Some(artifact) => {
                    debug!(%version, assembly = artifact.assembly_name(), "adopted skeleton");
                    state.artifact = Some(artifact);
                }
                None => debug!(
                    %version,
                    stale = state.artifact.is_some(),
                    "no skeleton built, keeping previous artifact"
                ),
            }
            state.version = version;
            state.artifact.clone()
        };

        Ok(artifact.map(|artifact| artifact.get_or_create_reference(properties)))
    }
}

impl Clone for SkeletonReferenceCache {
    fn clone(&self) -> Self {
        let snapshot = self.state.lock().clone();
        Self {
            state: Mutex::new(snapshot),
        }
    }
}

impl fmt::Debug for SkeletonReferenceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SkeletonReferenceCache")
            .field("version", &state.version)
            .field("artifact", &state.artifact)
            .finish()
    }
}
