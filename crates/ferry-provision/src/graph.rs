//! Small traversal helpers over the metadata store

use crate::ProvisionError;
use ferry_domain::{Direction, ElementId, MetadataStore, RelatedElement};

/// Default number of relationships fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Fetch every element related through `relationship_type`, page by page
pub(crate) fn related_all<S: MetadataStore>(
    store: &S,
    id: ElementId,
    direction: Direction,
    relationship_type: &str,
    page_size: usize,
) -> Result<Vec<RelatedElement>, ProvisionError> {
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut start = 0;

    loop {
        let page = store
            .get_related_elements(id, direction, relationship_type, start, page_size)
            .map_err(ProvisionError::store)?;
        let fetched = page.len();
        all.extend(page);
        if fetched < page_size {
            return Ok(all);
        }
        start += fetched;
    }
}

/// The first element related through `relationship_type`, if any
pub(crate) fn first_related<S: MetadataStore>(
    store: &S,
    id: ElementId,
    direction: Direction,
    relationship_type: &str,
) -> Result<Option<RelatedElement>, ProvisionError> {
    let mut page = store
        .get_related_elements(id, direction, relationship_type, 0, 1)
        .map_err(ProvisionError::store)?;
    Ok(if page.is_empty() { None } else { Some(page.swap_remove(0)) })
}
