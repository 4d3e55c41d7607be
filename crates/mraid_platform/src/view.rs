//! View hierarchy abstraction
//!
//! The display controller never draws anything itself. It rearranges host
//! views: the ad surface, a placeholder that keeps its slot in the layout,
//! and the overlay layers used while expanded. Hosts expose their display
//! list through [`ViewHierarchy`].

use crate::error::Result;

slotmap::new_key_type! {
    /// Handle to a host view
    pub struct ViewId;
}

/// Size in physical pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The role a view plays, so hosts can pick a native widget for it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Root content view of a window
    Content,
    /// Web surface rendering an ad payload
    AdSurface,
    /// Empty view holding the ad surface's slot while expanded
    Placeholder,
    /// Full-screen layer stacked above the host content
    ExpansionLayer,
    /// Transparent layer that swallows touches under the expanded ad
    DimmingLayer,
    /// Centered frame hosting the expanded content and the close button
    AdContainer,
    /// Native close affordance
    CloseButton,
}

/// One axis of a layout request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dimension {
    /// Match the parent
    #[default]
    Fill,
    /// Fixed size in physical pixels
    Exact(u32),
}

/// Placement of a child inside its parent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gravity {
    #[default]
    TopLeft,
    Center,
    TopRight,
}

/// Layout request used when inserting a child
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutParams {
    pub width: Dimension,
    pub height: Dimension,
    pub gravity: Gravity,
}

impl LayoutParams {
    /// Fill the parent on both axes
    pub fn fill() -> Self {
        Self::default()
    }

    /// Fixed pixel size
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Dimension::Exact(width),
            height: Dimension::Exact(height),
            gravity: Gravity::TopLeft,
        }
    }

    /// Set the gravity
    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }
}

/// Host display list
///
/// Implemented by each host (Android view tree, iOS view hierarchy, the
/// headless host used in tests).
pub trait ViewHierarchy {
    /// Create a detached view of the given kind
    fn create_view(&mut self, kind: ViewKind) -> ViewId;

    /// Release a view; detaches it first if needed
    fn release_view(&mut self, view: ViewId);

    /// Parent of a view, if attached
    fn parent(&self, view: ViewId) -> Option<ViewId>;

    /// Position of `child` within `parent`
    fn index_of(&self, parent: ViewId, child: ViewId) -> Option<usize>;

    /// Number of children of `parent`
    fn child_count(&self, parent: ViewId) -> usize;

    /// Insert `child` into `parent` at `index` (appended when `None`)
    fn insert_child(
        &mut self,
        parent: ViewId,
        child: ViewId,
        index: Option<usize>,
        params: LayoutParams,
    ) -> Result<()>;

    /// Detach `child` from `parent`
    fn remove_child(&mut self, parent: ViewId, child: ViewId) -> Result<()>;

    /// Detach every child of `parent`
    fn remove_all_children(&mut self, parent: ViewId);

    /// Root content view of the window `view` is attached to
    fn content_root(&self, view: ViewId) -> Option<ViewId>;

    /// Current measured size of a view
    fn size(&self, view: ViewId) -> Size;

    /// Toggle visibility
    fn set_visible(&mut self, view: ViewId, visible: bool);

    /// Check visibility
    fn is_visible(&self, view: ViewId) -> bool;

    /// Ask a view to lay itself out again
    fn request_layout(&mut self, _view: ViewId) {}

    /// Load a URL into an ad surface
    fn load_url(&mut self, surface: ViewId, url: &str) -> Result<()>;
}
