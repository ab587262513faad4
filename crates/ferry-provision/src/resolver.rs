//! Path resolution for catalogued files and folders
//!
//! A reference becomes a path by trying an ordered chain of strategies; the
//! first one that yields a path wins:
//!
//! 1. an explicit path carried by the reference
//! 2. the element's `pathName` property
//! 3. the network address of the endpoint behind the element's connection(s)
//! 4. the element's qualified name, as a last resort

use crate::graph::{first_related, related_all, DEFAULT_PAGE_SIZE};
use crate::ProvisionError;
use ferry_domain::names::{properties, relationships};
use ferry_domain::{Direction, ElementId, FileReference, MetadataStore};
use std::path::PathBuf;

/// One way of turning a reference into a path
pub trait PathStrategy<S: MetadataStore>: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Try to resolve the reference; `Ok(None)` passes to the next strategy
    fn try_resolve(
        &self,
        reference: &FileReference,
        store: &S,
    ) -> Result<Option<PathBuf>, ProvisionError>;
}

/// Uses a path the reference already carries
pub struct ExplicitPath;

impl<S: MetadataStore> PathStrategy<S> for ExplicitPath {
    fn name(&self) -> &'static str {
        "explicit-path"
    }

    fn try_resolve(&self, reference: &FileReference, _store: &S) -> Result<Option<PathBuf>, ProvisionError> {
        Ok(match reference {
            FileReference::Path(path) => Some(path.clone()),
            FileReference::Element(_) => None,
        })
    }
}

/// Reads the element's `pathName` property
pub struct PathNameProperty;

impl<S: MetadataStore> PathStrategy<S> for PathNameProperty {
    fn name(&self) -> &'static str {
        "path-name-property"
    }

    fn try_resolve(&self, reference: &FileReference, store: &S) -> Result<Option<PathBuf>, ProvisionError> {
        let Some(id) = reference.element_id() else {
            return Ok(None);
        };
        let path = store
            .get_element_property(id, properties::PATH_NAME)
            .map_err(ProvisionError::store)?;
        Ok(path.filter(|p| !p.is_empty()).map(PathBuf::from))
    }
}

/// Follows connection → endpoint links and reads the network address
///
/// With several connections, every one must lead to the same address;
/// disagreement leaves the reference unresolved rather than picking one.
pub struct ConnectionEndpoint {
    page_size: usize,
}

impl ConnectionEndpoint {
    /// Create the strategy with the given page size for connection listings
    pub fn new(page_size: usize) -> Self {
        Self { page_size }
    }

    fn endpoint_address<S: MetadataStore>(
        store: &S,
        connection_id: ElementId,
    ) -> Result<Option<String>, ProvisionError> {
        let endpoint = first_related(store, connection_id, Direction::Inbound, relationships::CONNECTION_ENDPOINT)?;
        Ok(endpoint.and_then(|e| {
            e.element
                .property(properties::NETWORK_ADDRESS)
                .filter(|address| !address.is_empty())
                .map(str::to_string)
        }))
    }
}

impl Default for ConnectionEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl<S: MetadataStore> PathStrategy<S> for ConnectionEndpoint {
    fn name(&self) -> &'static str {
        "connection-endpoint"
    }

    fn try_resolve(&self, reference: &FileReference, store: &S) -> Result<Option<PathBuf>, ProvisionError> {
        let Some(id) = reference.element_id() else {
            return Ok(None);
        };

        let connections = related_all(store, id, Direction::Inbound, relationships::CONNECTION_TO_ASSET, self.page_size)?;

        match connections.as_slice() {
            [] => {
                tracing::warn!(element = %id, "no connection linked to element");
                Ok(None)
            }
            [connection] => {
                let address = Self::endpoint_address(store, connection.element.id)?;
                if address.is_none() {
                    tracing::warn!(element = %id, connection = %connection.element.id, "connection has no endpoint address");
                }
                Ok(address.map(PathBuf::from))
            }
            many => {
                let mut addresses = Vec::with_capacity(many.len());
                for connection in many {
                    addresses.push(Self::endpoint_address(store, connection.element.id)?);
                }

                let first = addresses[0].clone();
                if first.is_some() && addresses.iter().all(|a| *a == first) {
                    Ok(first.map(PathBuf::from))
                } else {
                    tracing::warn!(
                        element = %id,
                        connections = many.len(),
                        addresses = ?addresses,
                        "connections disagree on the endpoint address; leaving path unresolved"
                    );
                    Ok(None)
                }
            }
        }
    }
}

/// Uses the qualified name as a stand-in path
pub struct QualifiedNameFallback;

impl<S: MetadataStore> PathStrategy<S> for QualifiedNameFallback {
    fn name(&self) -> &'static str {
        "qualified-name"
    }

    fn try_resolve(&self, reference: &FileReference, store: &S) -> Result<Option<PathBuf>, ProvisionError> {
        let Some(id) = reference.element_id() else {
            return Ok(None);
        };
        let name = store
            .get_element_property(id, properties::QUALIFIED_NAME)
            .map_err(ProvisionError::store)?;
        if let Some(name) = &name {
            tracing::info!(element = %id, qualified_name = %name, "using qualified name as path");
        }
        Ok(name.filter(|n| !n.is_empty()).map(PathBuf::from))
    }
}

/// Ordered chain of [`PathStrategy`] implementations
pub struct PathResolver<S: MetadataStore> {
    strategies: Vec<Box<dyn PathStrategy<S>>>,
}

impl<S: MetadataStore> PathResolver<S> {
    /// Build a resolver from an explicit list of strategies
    pub fn new(strategies: Vec<Box<dyn PathStrategy<S>>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: explicit path, `pathName`, connection endpoint, qualified name
    pub fn default_chain() -> Self {
        Self::new(vec![
            Box::new(ExplicitPath),
            Box::new(PathNameProperty),
            Box::new(ConnectionEndpoint::default()),
            Box::new(QualifiedNameFallback),
        ])
    }

    /// Resolve a reference to a path
    ///
    /// Store errors inside a strategy are logged and treated as "no answer"
    /// so the next strategy still gets its turn.
    pub fn resolve(&self, reference: &FileReference, store: &S) -> Result<PathBuf, ProvisionError> {
        for strategy in &self.strategies {
            match strategy.try_resolve(reference, store) {
                Ok(Some(path)) => {
                    tracing::debug!(
                        reference = %reference,
                        strategy = strategy.name(),
                        path = %path.display(),
                        "resolved path"
                    );
                    return Ok(path);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        reference = %reference,
                        strategy = strategy.name(),
                        error = %e,
                        "path strategy failed"
                    );
                }
            }
        }

        Err(ProvisionError::PathNotResolvable(reference.to_string()))
    }
}

impl<S: MetadataStore> Default for PathResolver<S> {
    fn default() -> Self {
        Self::default_chain()
    }
}
