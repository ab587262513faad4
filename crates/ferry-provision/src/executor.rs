//! Provisioning executor
//!
//! Places one file (copy, move or delete), then records lineage for it. The
//! outcome is always a [`CompletionRecord`]; file system failures become the
//! exception guard rather than an error.

use crate::allocator::{pattern_uses_index, DestinationNameAllocator};
use crate::config::{build_request, ProvisionerConfig, RequestOverrides};
use crate::lineage::LineageBuilder;
use crate::resolver::PathResolver;
use crate::ProvisionError;
use ferry_domain::{CompletionRecord, ElementId, FileOperation, MetadataStore, ProvisioningRequest};
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of the file system part of a run
enum Placement {
    Placed(PathBuf),
    Deleted,
    NoFreeName,
}

/// Carries out provisioning requests against the file system and the catalog
///
/// One provisioner is shared by every run in a process: the allocator it
/// holds is what keeps concurrent runs from choosing the same destination
/// name.
pub struct Provisioner<S: MetadataStore> {
    allocator: Arc<DestinationNameAllocator>,
    store: Arc<S>,
    resolver: PathResolver<S>,
    lineage: LineageBuilder<S>,
}

impl<S: MetadataStore> Provisioner<S> {
    /// Create a provisioner with a fresh allocator and the default resolver chain
    pub fn new(store: Arc<S>) -> Self {
        Self::with_allocator(store, Arc::new(DestinationNameAllocator::new()))
    }

    /// Create a provisioner sharing an existing allocator
    pub fn with_allocator(store: Arc<S>, allocator: Arc<DestinationNameAllocator>) -> Self {
        Self {
            allocator,
            lineage: LineageBuilder::new(Arc::clone(&store)),
            resolver: PathResolver::default_chain(),
            store,
        }
    }

    /// Replace the path resolver
    pub fn with_resolver(mut self, resolver: PathResolver<S>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Page size used when listing schema attributes for column lineage
    pub fn with_schema_page_size(mut self, page_size: usize) -> Self {
        self.lineage = self.lineage.with_schema_page_size(page_size);
        self
    }

    /// The shared name allocator
    pub fn allocator(&self) -> &Arc<DestinationNameAllocator> {
        &self.allocator
    }

    /// The metadata store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The path resolver
    pub fn resolver(&self) -> &PathResolver<S> {
        &self.resolver
    }

    /// Build a request from configuration and per-call values, then run it
    ///
    /// Configuration problems are returned as errors before any file is
    /// touched; everything after that is reported through the record.
    pub fn provision_with(
        &self,
        config: &ProvisionerConfig,
        overrides: &RequestOverrides,
    ) -> Result<CompletionRecord, ProvisionError> {
        let request = build_request(config, overrides, &self.resolver, self.store.as_ref())?;
        Ok(self.provision(&request))
    }

    /// Run one provisioning request
    pub fn provision(&self, request: &ProvisioningRequest) -> CompletionRecord {
        tracing::info!(
            operation = %request.operation(),
            source = %request.source_path().display(),
            destination = %request.destination_folder().display(),
            pattern = request.destination_name_pattern(),
            "provisioning file"
        );

        let placement = match request.operation() {
            FileOperation::Delete => self.delete(request),
            FileOperation::Copy | FileOperation::Move => self.place(request),
        };

        match placement {
            Ok(Placement::Deleted) => CompletionRecord::complete(None, None),
            Ok(Placement::Placed(destination)) => {
                let new_asset = self.record_lineage(request, &destination);
                tracing::info!(destination = %destination.display(), "provisioning complete");
                CompletionRecord::complete(Some(destination), new_asset)
            }
            Ok(Placement::NoFreeName) => {
                tracing::warn!(
                    source = %request.source_path().display(),
                    destination = %request.destination_folder().display(),
                    pattern = request.destination_name_pattern(),
                    indexed = pattern_uses_index(request.destination_name_pattern()),
                    "no free destination file name"
                );
                CompletionRecord::no_file_names()
            }
            Err(e) => {
                tracing::error!(
                    operation = %request.operation(),
                    source = %request.source_path().display(),
                    destination = %request.destination_folder().display(),
                    pattern = request.destination_name_pattern(),
                    error = %e,
                    "provisioning failed"
                );
                CompletionRecord::exception(e.to_string())
            }
        }
    }

    fn delete(&self, request: &ProvisioningRequest) -> Result<Placement, ProvisionError> {
        let source = request.source_path();
        fs::remove_file(source).map_err(|e| ProvisionError::io("deleting source file", source, e))?;
        tracing::debug!(source = %source.display(), "source file deleted");
        Ok(Placement::Deleted)
    }

    /// Choose a free destination name and copy or move the file there
    fn place(&self, request: &ProvisioningRequest) -> Result<Placement, ProvisionError> {
        let source = request.source_path();
        let folder = request.destination_folder();
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ProvisionError::PathNotResolvable(format!("source {} has no file name", source.display()))
            })?;

        fs::create_dir_all(folder)
            .map_err(|e| ProvisionError::io("creating destination folder", folder, e))?;

        let mut previous: Option<String> = None;
        loop {
            let Some(candidate) = self.allocator.next_candidate(
                previous.as_deref(),
                folder,
                &file_name,
                request.destination_name_pattern(),
            ) else {
                return Ok(Placement::NoFreeName);
            };

            let destination = folder.join(&candidate);
            let placed = match request.operation() {
                FileOperation::Move => move_file(source, &destination)?,
                _ => copy_file(source, &destination)?,
            };
            if placed {
                return Ok(Placement::Placed(destination));
            }

            tracing::debug!(candidate = %candidate, "destination name taken");
            previous = Some(candidate);
        }
    }

    /// Lineage is best effort; failures never change the guard
    fn record_lineage(&self, request: &ProvisioningRequest, destination: &Path) -> Option<ElementId> {
        let options = request.lineage();
        if !options.enabled {
            return None;
        }
        match self.lineage.build(&request.source_reference(), destination, options) {
            Ok(outcome) => outcome.destination_asset,
            Err(e) => {
                tracing::warn!(destination = %destination.display(), error = %e, "lineage not recorded");
                None
            }
        }
    }
}

/// Copy `source` to a new file at `destination`
///
/// Returns `false` without touching anything when `destination` exists.
/// Permissions and modification/access times are carried over.
fn copy_file(source: &Path, destination: &Path) -> Result<bool, ProvisionError> {
    let mut input = File::open(source).map_err(|e| ProvisionError::io("opening source file", source, e))?;
    let metadata = input
        .metadata()
        .map_err(|e| ProvisionError::io("reading source metadata", source, e))?;

    let mut output = match OpenOptions::new().write(true).create_new(true).open(destination) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(ProvisionError::io("creating destination file", destination, e)),
    };

    let copied = io::copy(&mut input, &mut output)
        .and_then(|_| output.set_permissions(metadata.permissions()))
        .and_then(|()| output.set_times(file_times(&metadata)));
    if let Err(e) = copied {
        drop(output);
        if let Err(cleanup) = fs::remove_file(destination) {
            tracing::warn!(destination = %destination.display(), error = %cleanup, "partial copy left behind");
        }
        return Err(ProvisionError::io("copying file", destination, e));
    }
    Ok(true)
}

/// Move `source` to `destination`, copying across devices
///
/// Returns `false` when `destination` is occupied by a different file. The
/// new name is created with a hard link, which never replaces an existing
/// entry; the source name is removed once the link exists.
fn move_file(source: &Path, destination: &Path) -> Result<bool, ProvisionError> {
    match fs::hard_link(source, destination) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(same_file(source, destination)),
        Err(e) if matches!(e.kind(), ErrorKind::CrossesDevices | ErrorKind::Unsupported) => {
            tracing::debug!(source = %source.display(), error = %e, "cannot link; copying instead");
            if !copy_file(source, destination)? {
                return Ok(false);
            }
            fs::remove_file(source).map_err(|e| ProvisionError::io("removing moved source file", source, e))?;
            return Ok(true);
        }
        Err(e) => return Err(ProvisionError::io("moving file", source, e)),
    }

    if let Err(e) = fs::remove_file(source) {
        if let Err(cleanup) = fs::remove_file(destination) {
            tracing::warn!(destination = %destination.display(), error = %cleanup, "moved file left at both names");
        }
        return Err(ProvisionError::io("removing moved source file", source, e));
    }
    Ok(true)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn file_times(metadata: &fs::Metadata) -> FileTimes {
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    times
}
