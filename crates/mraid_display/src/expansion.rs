//! Expand and collapse orchestration
//!
//! Expanding moves the ad out of its layout slot and onto a full-screen
//! layer above the host content:
//!
//! ```text
//! root content
//! └── expansion layer (fill)
//!     ├── dimming layer (fill, swallows touches)
//!     └── ad container (centered, requested size)
//!         ├── ad surface or secondary surface (fill)
//!         └── close button (top right, optional)
//! ```
//!
//! A placeholder of the same size keeps the ad's slot in its original
//! parent until collapse puts everything back.

use mraid_platform::{Gravity, LayoutParams, Size, ViewHierarchy, ViewId, ViewKind};
use tracing::{debug, warn};

use crate::controller::AdDisplayController;

/// Where the ad surface lived before expanding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpansionSnapshot {
    pub parent: ViewId,
    pub index: usize,
    pub size: Size,
}

/// Owns the views used while expanded
pub struct ExpansionCoordinator {
    placeholder: ViewId,
    expansion_layer: ViewId,
    ad_container: ViewId,
    dimming: Option<ViewId>,
    root: Option<ViewId>,
    snapshot: Option<ExpansionSnapshot>,
    secondary: Option<Box<AdDisplayController>>,
}

impl ExpansionCoordinator {
    pub fn new<H: ViewHierarchy + ?Sized>(host: &mut H) -> Self {
        Self {
            placeholder: host.create_view(ViewKind::Placeholder),
            expansion_layer: host.create_view(ViewKind::ExpansionLayer),
            ad_container: host.create_view(ViewKind::AdContainer),
            dimming: None,
            root: None,
            snapshot: None,
            secondary: None,
        }
    }

    pub fn placeholder(&self) -> ViewId {
        self.placeholder
    }

    pub fn expansion_layer(&self) -> ViewId {
        self.expansion_layer
    }

    pub fn ad_container(&self) -> ViewId {
        self.ad_container
    }

    /// Root content view found at the last expand
    pub fn root(&self) -> Option<ViewId> {
        self.root
    }

    pub fn snapshot(&self) -> Option<ExpansionSnapshot> {
        self.snapshot
    }

    pub fn secondary(&self) -> Option<&AdDisplayController> {
        self.secondary.as_deref()
    }

    pub fn secondary_mut(&mut self) -> Option<&mut AdDisplayController> {
        self.secondary.as_deref_mut()
    }

    pub fn set_secondary(&mut self, secondary: Option<Box<AdDisplayController>>) {
        self.secondary = secondary;
    }

    pub fn take_secondary(&mut self) -> Option<Box<AdDisplayController>> {
        self.secondary.take()
    }

    /// Put the placeholder where `surface` is and detach `surface`
    ///
    /// A surface without a parent is left alone and no snapshot is taken.
    pub fn swap_in_placeholder<H: ViewHierarchy + ?Sized>(&mut self, host: &mut H, surface: ViewId) {
        let Some(parent) = host.parent(surface) else {
            debug!("Ad surface has no parent, skipping placeholder swap");
            return;
        };
        let index = host
            .index_of(parent, surface)
            .unwrap_or_else(|| host.child_count(parent));
        let size = host.size(surface);

        let params = LayoutParams::exact(size.width, size.height);
        if let Err(err) = host.insert_child(parent, self.placeholder, Some(index), params) {
            warn!(error = %err, "Failed to insert placeholder");
            return;
        }
        if let Err(err) = host.remove_child(parent, surface) {
            warn!(error = %err, "Failed to detach ad surface");
        }

        self.snapshot = Some(ExpansionSnapshot {
            parent,
            index,
            size,
        });
    }

    /// Build the overlay around `content` and attach it to `root`
    ///
    /// Container dimensions are in physical pixels and never smaller than
    /// `min_edge`.
    pub fn present<H: ViewHierarchy + ?Sized>(
        &mut self,
        host: &mut H,
        root: ViewId,
        content: ViewId,
        width: u32,
        height: u32,
        min_edge: u32,
    ) {
        self.root = Some(root);

        let dimming = host.create_view(ViewKind::DimmingLayer);
        self.dimming = Some(dimming);

        let container_params =
            LayoutParams::exact(width.max(min_edge), height.max(min_edge)).gravity(Gravity::Center);
        let steps = [
            (self.expansion_layer, dimming, LayoutParams::fill()),
            (self.ad_container, content, LayoutParams::fill()),
            (self.expansion_layer, self.ad_container, container_params),
            (root, self.expansion_layer, LayoutParams::fill()),
        ];

        for (parent, child, params) in steps {
            if let Err(err) = host.insert_child(parent, child, None, params) {
                warn!(error = %err, "Failed to build expansion layout");
            }
        }
    }

    /// Undo [`present`](Self::present) and the placeholder swap
    ///
    /// Returns the secondary controller, if any, so the caller can destroy
    /// it once it no longer holds the host.
    pub fn collapse<H: ViewHierarchy + ?Sized>(
        &mut self,
        host: &mut H,
        surface: ViewId,
    ) -> Option<Box<AdDisplayController>> {
        self.dismantle(host, surface);
        self.secondary.take()
    }

    /// Release the placeholder and overlay views
    ///
    /// An overlay still on screen is dismantled first so `surface` goes back
    /// to its slot. The secondary controller must already have been taken.
    pub fn release<H: ViewHierarchy + ?Sized>(&mut self, host: &mut H, surface: ViewId) {
        if self.snapshot.is_some() || host.parent(self.expansion_layer).is_some() {
            self.dismantle(host, surface);
        }
        for view in [self.ad_container, self.expansion_layer, self.placeholder] {
            host.release_view(view);
        }
    }

    fn dismantle<H: ViewHierarchy + ?Sized>(&mut self, host: &mut H, surface: ViewId) {
        host.remove_all_children(self.ad_container);
        host.remove_all_children(self.expansion_layer);
        if let Some(root) = self.root {
            if let Err(err) = host.remove_child(root, self.expansion_layer) {
                debug!(error = %err, "Expansion layer was not attached");
            }
        }
        if let Some(dimming) = self.dimming.take() {
            host.release_view(dimming);
        }

        host.request_layout(surface);

        if let Some(snapshot) = self.snapshot.take() {
            let params = LayoutParams::exact(snapshot.size.width, snapshot.size.height);
            if let Err(err) = host.insert_child(snapshot.parent, surface, Some(snapshot.index), params)
            {
                warn!(error = %err, "Failed to restore ad surface");
            }
            if let Err(err) = host.remove_child(snapshot.parent, self.placeholder) {
                debug!(error = %err, "Placeholder was not attached");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use mraid_platform::Dimension;

    #[test]
    fn test_swap_keeps_slot() {
        let mut host = HeadlessHost::new();
        let root = host.root();
        let banner_above = host.attach_view(root, ViewKind::Placeholder, 320, 20);
        let surface = host.attach_ad_surface(320, 50);
        let banner_below = host.attach_view(root, ViewKind::Placeholder, 320, 20);

        let mut coordinator = ExpansionCoordinator::new(&mut host);
        coordinator.swap_in_placeholder(&mut host, surface);

        assert_eq!(host.children(root), vec![banner_above, coordinator.placeholder(), banner_below]);
        assert_eq!(host.size(coordinator.placeholder()), Size::new(320, 50));
        assert_eq!(
            coordinator.snapshot(),
            Some(ExpansionSnapshot {
                parent: root,
                index: 1,
                size: Size::new(320, 50),
            })
        );
    }

    #[test]
    fn test_orphan_surface_is_not_swapped() {
        let mut host = HeadlessHost::new();
        let surface = host.create_view(ViewKind::AdSurface);

        let mut coordinator = ExpansionCoordinator::new(&mut host);
        coordinator.swap_in_placeholder(&mut host, surface);

        assert_eq!(coordinator.snapshot(), None);
        assert_eq!(host.parent(coordinator.placeholder()), None);
    }

    #[test]
    fn test_present_and_collapse_are_inverse() {
        let mut host = HeadlessHost::new();
        let root = host.root();
        let surface = host.attach_ad_surface(320, 50);
        let before = host.children(root);

        let mut coordinator = ExpansionCoordinator::new(&mut host);
        coordinator.swap_in_placeholder(&mut host, surface);
        coordinator.present(&mut host, root, surface, 20, 600, 50);

        let layer = coordinator.expansion_layer();
        let container = coordinator.ad_container();
        assert_eq!(host.parent(layer), Some(root));
        assert_eq!(host.children(layer).len(), 2);
        assert_eq!(host.kind(host.children(layer)[0]), Some(ViewKind::DimmingLayer));
        assert_eq!(host.children(container), vec![surface]);

        let params = host.layout_params(container).unwrap();
        assert_eq!(params.width, Dimension::Exact(50));
        assert_eq!(params.height, Dimension::Exact(600));
        assert_eq!(params.gravity, Gravity::Center);

        assert!(coordinator.collapse(&mut host, surface).is_none());
        assert_eq!(host.children(root), before);
        assert_eq!(host.children(layer), vec![]);
        assert_eq!(host.children(container), vec![]);
        assert_eq!(host.parent(coordinator.placeholder()), None);
        assert_eq!(coordinator.snapshot(), None);
    }

    #[test]
    fn test_release_while_presented() {
        let mut host = HeadlessHost::new();
        let root = host.root();
        let surface = host.attach_ad_surface(320, 50);
        let before = host.children(root);

        let mut coordinator = ExpansionCoordinator::new(&mut host);
        coordinator.swap_in_placeholder(&mut host, surface);
        coordinator.present(&mut host, root, surface, 300, 250, 50);
        coordinator.release(&mut host, surface);

        assert_eq!(host.children(root), before);
        assert!(host.contains(surface));
        for view in [
            coordinator.placeholder(),
            coordinator.expansion_layer(),
            coordinator.ad_container(),
        ] {
            assert!(!host.contains(view));
        }
    }
}
