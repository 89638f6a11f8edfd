//! Published catalog generations.
//!
//! Requests read whichever generation is current when they start and keep
//! it for their whole lifetime. A reload builds the next generation off the
//! async workers and swaps it in; a failed reload leaves the current one
//! serving.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::spatial::StopIndex;

use super::Catalog;
use super::error::CatalogError;
use super::import::load_gtfs_dir;

/// A catalog together with its spatial index.
#[derive(Debug)]
pub struct CatalogGeneration {
    pub catalog: Catalog,
    pub index: StopIndex,
    /// Starts at 1 and increases with every publish.
    pub number: u64,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogGeneration {
    fn new(catalog: Catalog, index: StopIndex, number: u64) -> Self {
        Self {
            catalog,
            index,
            number,
            loaded_at: Utc::now(),
        }
    }
}

/// Shared handle to the current generation.
///
/// Cloning is cheap; all clones see the same generation. Readers never
/// lock: [`CatalogHandle::current`] is a single atomic load. Publishers
/// queue among themselves so generation numbers stay consecutive.
#[derive(Clone)]
pub struct CatalogHandle {
    current: Arc<ArcSwap<CatalogGeneration>>,
    publishing: Arc<Mutex<()>>,
}

impl CatalogHandle {
    /// Publish `catalog` as generation 1.
    pub fn new(catalog: Catalog) -> Self {
        let index = StopIndex::build(catalog.stops());
        Self {
            current: Arc::new(ArcSwap::from_pointee(CatalogGeneration::new(
                catalog, index, 1,
            ))),
            publishing: Arc::new(Mutex::new(())),
        }
    }

    /// The generation serving right now.
    pub fn current(&self) -> Arc<CatalogGeneration> {
        self.current.load_full()
    }

    /// Replace the current generation. Returns the new generation number.
    ///
    /// The spatial index is built before any other publisher is waited on.
    pub async fn publish(&self, catalog: Catalog) -> u64 {
        let index = StopIndex::build(catalog.stops());
        let _publishing = self.publishing.lock().await;
        let number = self.current.load().number + 1;
        self.current
            .store(Arc::new(CatalogGeneration::new(catalog, index, number)));
        number
    }

    /// Load a feed from `dir` and publish it.
    ///
    /// On failure the current generation is kept and the error returned.
    pub async fn reload_from(
        &self,
        dir: PathBuf,
        default_timezone: Tz,
    ) -> Result<u64, CatalogError> {
        let loaded =
            tokio::task::spawn_blocking(move || load_gtfs_dir(&dir, default_timezone)).await;
        match loaded.map_err(CatalogError::from).and_then(|r| r) {
            Ok(catalog) => {
                let number = self.publish(catalog).await;
                info!(generation = number, "Published catalog generation");
                Ok(number)
            }
            Err(e) => {
                warn!(error = %e, "Catalog reload failed, keeping current generation");
                Err(e)
            }
        }
    }
}
