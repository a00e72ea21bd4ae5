#![forbid(unsafe_code)]

//! Screen-reader isolation for modal surfaces.
//!
//! While a modal surface is open, everything else under its mount
//! point is marked `aria-hidden="true"` so assistive technology only
//! announces the surface. The hider records which elements it
//! changed and restores exactly those on release; elements that were
//! already hidden by the application keep their attribute.

use std::rc::Rc;

use scrim_core::{NodeId, Platform};
use tracing::trace;

/// RAII guard hiding the siblings of the spared subtrees.
pub struct SiblingHider {
    platform: Rc<dyn Platform>,
    hidden: Vec<NodeId>,
}

impl SiblingHider {
    /// Hide every sibling of the `spared` nodes under the first
    /// node's parent.
    ///
    /// All spared nodes must share that parent. Only elements without
    /// a pre-existing `aria-hidden` attribute are touched.
    pub fn install(platform: &Rc<dyn Platform>, spared: &[NodeId]) -> Self {
        let mut hidden = Vec::new();
        if let Some(&anchor) = spared.first() {
            for sibling in platform.siblings_of(anchor) {
                if spared.contains(&sibling) {
                    continue;
                }
                if platform.attr(sibling, "aria-hidden").is_none() {
                    platform.set_attr(sibling, "aria-hidden", "true");
                    hidden.push(sibling);
                }
            }
        }
        trace!(count = hidden.len(), "siblings hidden");
        Self {
            platform: Rc::clone(platform),
            hidden,
        }
    }

    /// Restore the elements this hider changed. Idempotent.
    pub fn release(&mut self) {
        for node in self.hidden.drain(..) {
            self.platform.remove_attr(node, "aria-hidden");
        }
    }
}

impl Drop for SiblingHider {
    fn drop(&mut self) {
        self.release();
    }
}
