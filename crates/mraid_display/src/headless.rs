//! In-memory host
//!
//! [`HeadlessHost`] keeps a display list in a slotmap and records every
//! service request. It backs the test suite and the `mraid replay` command.

use mraid_core::RecordingSink;
use mraid_platform::{
    CalendarEvent, CalendarHost, ConfigurationListener, DeviceFeatures, DeviceInfo,
    DeviceOrientation, Dimension, DisplayMetrics, LayoutParams, ListenerToken, MediaPlayer,
    OrientationHost, PlatformError, PromptOutcome, RequestedOrientation, Result, Rotation, Size,
    UserPrompt, ViewHierarchy, ViewId, ViewKind,
};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::host::{Host, SecondarySurface};

struct Node {
    kind: ViewKind,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    params: LayoutParams,
    size: Size,
    visible: bool,
    url: Option<String>,
}

impl Node {
    fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            params: LayoutParams::default(),
            size: Size::default(),
            visible: true,
            url: None,
        }
    }
}

/// Host with no native UI
pub struct HeadlessHost {
    views: SlotMap<ViewId, Node>,
    root: ViewId,
    metrics: DisplayMetrics,
    features: DeviceFeatures,
    requested: RequestedOrientation,
    orientation_capable: bool,
    device_orientation: DeviceOrientation,
    rotation: Rotation,
    listeners: FxHashMap<u64, ConfigurationListener>,
    next_token: u64,
    calendar_available: bool,
    calendar_events: Vec<CalendarEvent>,
    video_available: bool,
    videos: Vec<String>,
    prompt_available: bool,
    prompts: Vec<String>,
    notices: Vec<String>,
    secondary_log: RecordingSink,
    url_loading: bool,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// A portrait 480x800 mdpi screen with every capability
    pub fn new() -> Self {
        let metrics = DisplayMetrics::default();
        let mut views = SlotMap::with_key();
        let mut root = Node::new(ViewKind::Content);
        root.size = Size::new(metrics.width_px, metrics.height_px);
        let root = views.insert(root);

        Self {
            views,
            root,
            metrics,
            features: DeviceFeatures::all(),
            requested: RequestedOrientation::Unspecified,
            orientation_capable: true,
            device_orientation: DeviceOrientation::Portrait,
            rotation: Rotation::Deg0,
            listeners: FxHashMap::default(),
            next_token: 1,
            calendar_available: true,
            calendar_events: Vec::new(),
            video_available: true,
            videos: Vec::new(),
            prompt_available: true,
            prompts: Vec::new(),
            notices: Vec::new(),
            secondary_log: RecordingSink::new(),
            url_loading: true,
        }
    }

    /// Root content view
    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Create a view of a fixed size and append it to `parent`
    pub fn attach_view(&mut self, parent: ViewId, kind: ViewKind, width: u32, height: u32) -> ViewId {
        let view = self.create_view(kind);
        if let Err(err) = self.insert_child(parent, view, None, LayoutParams::exact(width, height)) {
            debug!(error = %err, "Failed to attach view");
        }
        view
    }

    /// Create an ad surface and append it to the root
    pub fn attach_ad_surface(&mut self, width: u32, height: u32) -> ViewId {
        self.attach_view(self.root, ViewKind::AdSurface, width, height)
    }

    /// Number of live views, the root included
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Make every `load_url` fail
    pub fn set_url_loading(&mut self, enabled: bool) {
        self.url_loading = enabled;
    }

    pub fn contains(&self, view: ViewId) -> bool {
        self.views.contains_key(view)
    }

    pub fn kind(&self, view: ViewId) -> Option<ViewKind> {
        self.views.get(view).map(|node| node.kind)
    }

    pub fn children(&self, parent: ViewId) -> Vec<ViewId> {
        self.views
            .get(parent)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn layout_params(&self, view: ViewId) -> Option<LayoutParams> {
        self.views.get(view).map(|node| node.params)
    }

    /// URL last loaded into a surface
    pub fn loaded_url(&self, view: ViewId) -> Option<String> {
        self.views.get(view).and_then(|node| node.url.clone())
    }

    pub fn set_display_metrics(&mut self, metrics: DisplayMetrics) {
        self.metrics = metrics;
        if let Some(root) = self.views.get_mut(self.root) {
            root.size = Size::new(metrics.width_px, metrics.height_px);
        }
    }

    pub fn set_features(&mut self, features: DeviceFeatures) {
        self.features = features;
    }

    pub fn requested(&self) -> RequestedOrientation {
        self.requested
    }

    pub fn set_requested(&mut self, orientation: RequestedOrientation) {
        self.requested = orientation;
    }

    /// Whether orientation requests succeed
    pub fn set_orientation_capable(&mut self, capable: bool) {
        self.orientation_capable = capable;
    }

    pub fn set_device_orientation(&mut self, orientation: DeviceOrientation) {
        self.device_orientation = orientation;
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify every configuration listener
    pub fn fire_configuration_changed(&self) {
        trace!(listeners = self.listeners.len(), "Configuration changed");
        for listener in self.listeners.values() {
            listener();
        }
    }

    /// Whether a calendar app is installed
    pub fn set_calendar_available(&mut self, available: bool) {
        self.calendar_available = available;
    }

    pub fn calendar_events(&self) -> Vec<CalendarEvent> {
        self.calendar_events.clone()
    }

    pub fn set_video_available(&mut self, available: bool) {
        self.video_available = available;
    }

    pub fn videos(&self) -> Vec<String> {
        self.videos.clone()
    }

    /// Whether confirmation dialogs can be shown
    pub fn set_prompt_available(&mut self, available: bool) {
        self.prompt_available = available;
    }

    /// URLs the user was asked to save
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.clone()
    }

    /// Events sent to two-part expansion content
    pub fn secondary_log(&self) -> RecordingSink {
        self.secondary_log.clone()
    }

    fn node(&self, view: ViewId) -> Result<&Node> {
        self.views
            .get(view)
            .ok_or_else(|| PlatformError::Hierarchy(format!("unknown view {view:?}")))
    }

    fn detach(&mut self, view: ViewId) {
        let Some(parent) = self.views.get_mut(view).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.views.get_mut(parent) {
            parent.children.retain(|child| *child != view);
        }
    }

    fn unsupported_orientation() -> PlatformError {
        PlatformError::Unsupported("host context cannot control orientation".to_string())
    }
}

impl ViewHierarchy for HeadlessHost {
    fn create_view(&mut self, kind: ViewKind) -> ViewId {
        self.views.insert(Node::new(kind))
    }

    fn release_view(&mut self, view: ViewId) {
        self.detach(view);
        if let Some(node) = self.views.remove(view) {
            for child in node.children {
                if let Some(child) = self.views.get_mut(child) {
                    child.parent = None;
                }
            }
        }
    }

    fn parent(&self, view: ViewId) -> Option<ViewId> {
        self.views.get(view).and_then(|node| node.parent)
    }

    fn index_of(&self, parent: ViewId, child: ViewId) -> Option<usize> {
        self.views
            .get(parent)?
            .children
            .iter()
            .position(|candidate| *candidate == child)
    }

    fn child_count(&self, parent: ViewId) -> usize {
        self.views.get(parent).map_or(0, |node| node.children.len())
    }

    fn insert_child(
        &mut self,
        parent: ViewId,
        child: ViewId,
        index: Option<usize>,
        params: LayoutParams,
    ) -> Result<()> {
        if parent == child {
            return Err(PlatformError::Hierarchy("view cannot contain itself".into()));
        }
        let parent_node = self.node(parent)?;
        let parent_size = parent_node.size;
        let count = parent_node.children.len();
        if self.node(child)?.parent.is_some() {
            return Err(PlatformError::Hierarchy(format!(
                "view {child:?} already has a parent"
            )));
        }
        let index = index.unwrap_or(count);
        if index > count {
            return Err(PlatformError::Hierarchy(format!(
                "index {index} out of bounds for {count} children"
            )));
        }

        let resolve = |dimension: Dimension, fill: u32| match dimension {
            Dimension::Fill => fill,
            Dimension::Exact(value) => value,
        };
        if let Some(node) = self.views.get_mut(child) {
            node.parent = Some(parent);
            node.params = params;
            node.size = Size::new(
                resolve(params.width, parent_size.width),
                resolve(params.height, parent_size.height),
            );
        }
        if let Some(node) = self.views.get_mut(parent) {
            node.children.insert(index, child);
        }
        Ok(())
    }

    fn remove_child(&mut self, parent: ViewId, child: ViewId) -> Result<()> {
        if self.index_of(parent, child).is_none() {
            return Err(PlatformError::Hierarchy(format!(
                "view {child:?} is not a child of {parent:?}"
            )));
        }
        self.detach(child);
        Ok(())
    }

    fn remove_all_children(&mut self, parent: ViewId) {
        for child in self.children(parent) {
            self.detach(child);
        }
    }

    fn content_root(&self, view: ViewId) -> Option<ViewId> {
        let mut current = view;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        (self.kind(current) == Some(ViewKind::Content)).then_some(current)
    }

    fn size(&self, view: ViewId) -> Size {
        self.views.get(view).map(|node| node.size).unwrap_or_default()
    }

    fn set_visible(&mut self, view: ViewId, visible: bool) {
        if let Some(node) = self.views.get_mut(view) {
            node.visible = visible;
        }
    }

    fn is_visible(&self, view: ViewId) -> bool {
        self.views.get(view).is_some_and(|node| node.visible)
    }

    fn load_url(&mut self, surface: ViewId, url: &str) -> Result<()> {
        if !self.url_loading {
            return Err(PlatformError::Unavailable("url loading disabled".into()));
        }
        let node = self
            .views
            .get_mut(surface)
            .filter(|node| node.kind == ViewKind::AdSurface)
            .ok_or_else(|| PlatformError::Hierarchy(format!("{surface:?} is not an ad surface")))?;
        node.url = Some(url.to_string());
        Ok(())
    }
}

impl OrientationHost for HeadlessHost {
    fn requested_orientation(&self) -> Result<RequestedOrientation> {
        if !self.orientation_capable {
            return Err(Self::unsupported_orientation());
        }
        Ok(self.requested)
    }

    fn set_requested_orientation(&mut self, orientation: RequestedOrientation) -> Result<()> {
        if !self.orientation_capable {
            return Err(Self::unsupported_orientation());
        }
        self.requested = orientation;
        Ok(())
    }

    fn device_orientation(&self) -> DeviceOrientation {
        self.device_orientation
    }

    fn display_rotation(&self) -> Rotation {
        self.rotation
    }

    fn register_configuration_listener(
        &mut self,
        listener: ConfigurationListener,
    ) -> Result<ListenerToken> {
        let token = self.next_token;
        self.next_token += 1;
        self.listeners.insert(token, listener);
        Ok(ListenerToken(token))
    }

    fn unregister_configuration_listener(&mut self, token: ListenerToken) -> Result<()> {
        self.listeners
            .remove(&token.0)
            .map(|_| ())
            .ok_or_else(|| PlatformError::NotRegistered(format!("listener {}", token.0)))
    }
}

impl DeviceInfo for HeadlessHost {
    fn display_metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    fn device_features(&self) -> DeviceFeatures {
        self.features
    }
}

impl CalendarHost for HeadlessHost {
    fn insert_calendar_event(&mut self, event: &CalendarEvent) -> Result<()> {
        if !self.calendar_available {
            return Err(PlatformError::Unavailable("no calendar app installed".into()));
        }
        self.calendar_events.push(event.clone());
        Ok(())
    }
}

impl MediaPlayer for HeadlessHost {
    fn play_video(&mut self, url: &str) -> Result<()> {
        if !self.video_available {
            return Err(PlatformError::Unavailable("no video player".into()));
        }
        self.videos.push(url.to_string());
        Ok(())
    }
}

impl UserPrompt for HeadlessHost {
    fn confirm_picture_download(&mut self, url: &str) -> PromptOutcome {
        if !self.prompt_available {
            return PromptOutcome::Unavailable;
        }
        self.prompts.push(url.to_string());
        PromptOutcome::Shown
    }

    fn show_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

impl Host for HeadlessHost {
    fn create_secondary_surface(&mut self) -> std::result::Result<SecondarySurface, PlatformError> {
        let view = self.create_view(ViewKind::AdSurface);
        Ok(SecondarySurface {
            view,
            sink: Box::new(self.secondary_log.clone()),
        })
    }
}
