//! The ad display state machine
//!
//! [`AdDisplayController`] owns the [`ViewState`] of one ad surface and is
//! the only place it changes. Commands, host notifications and timer ticks
//! all arrive through [`AdDisplayController::handle_message`] on the control
//! loop.

use std::collections::HashMap;
use std::path::PathBuf;

use mraid_core::{
    translate_calendar_request, AdEventSink, CommandName, ExpandRequest, ExpansionStyle,
    MraidCommand, MraidProperty, PlacementType, Supports, ViewState,
};
use mraid_platform::{DeviceFeatures, PlatformError, PromptOutcome, ViewId};
use tracing::{debug, info, warn};
use url::Url;

use crate::close_button::CloseButtonController;
use crate::config::ControllerConfig;
use crate::error::DownloadError;
use crate::expansion::ExpansionCoordinator;
use crate::host::{SecondarySurface, SharedHost};
use crate::metrics::ScreenMetrics;
use crate::orientation::{OrientationLockManager, RotationSubscription};
use crate::picture::PictureDownloader;
use crate::runtime::{ControlFlow, ControlMessage, ControlSender};
use crate::viewability::{ViewabilityCheck, ViewabilityMonitor};

/// Schemes accepted for two-part expansion content
const EXPAND_URL_SCHEMES: &[&str] = &[
    "http",
    "https",
    "file",
    "data",
    "about",
    "javascript",
    "content",
    "asset",
    "resource",
];

pub const EXPAND_URL_INVALID: &str = "URL passed to expand() was invalid.";
pub const CALENDAR_API_UNAVAILABLE: &str =
    "Action is unsupported on this device (calendar API unavailable)";
pub const NO_CALENDAR_APP: &str = "Action is unsupported on this device - no calendar app installed";
pub const CALENDAR_FAILED: &str = "could not create calendar event";
pub const PICTURE_FAILED: &str = "Error downloading and saving image file.";
pub const PICTURE_NOTICE: &str = "Downloading image to Picture gallery";
const SECONDARY_FAILED: &str = "Unable to create expansion content.";

/// Display controller for one ad surface
pub struct AdDisplayController {
    config: ControllerConfig,
    host: SharedHost,
    surface: ViewId,
    sink: Box<dyn AdEventSink>,
    sender: ControlSender,
    view_state: ViewState,
    metrics: ScreenMetrics,
    features: DeviceFeatures,
    monitor: ViewabilityMonitor,
    orientation: OrientationLockManager,
    rotation: RotationSubscription,
    close_button: CloseButtonController,
    expansion: ExpansionCoordinator,
    pictures: PictureDownloader,
    /// Identifies two-part content to its outer controller; 0 otherwise
    generation: u64,
    last_generation: u64,
    destroyed: bool,
}

impl AdDisplayController {
    /// Create a controller in the loading state
    ///
    /// Captures the requested orientation, measures the screen, starts
    /// viewability polling and subscribes to configuration changes.
    pub fn new(
        config: ControllerConfig,
        host: SharedHost,
        surface: ViewId,
        sink: Box<dyn AdEventSink>,
        sender: ControlSender,
        pictures: PictureDownloader,
    ) -> Self {
        let (orientation, metrics, features, expansion) = {
            let mut host = host.borrow_mut();
            (
                OrientationLockManager::capture(&*host),
                ScreenMetrics::from_display(&host.display_metrics()),
                host.device_features(),
                ExpansionCoordinator::new(&mut *host),
            )
        };
        let rotation = RotationSubscription::register(&host, sender.configuration_listener());
        let close_button = CloseButtonController::new(
            config.close_button_style,
            metrics.to_px_rounded(config.close_button_size_dp),
        );

        let mut monitor = ViewabilityMonitor::default();
        monitor.start();

        debug!(
            placement = config.placement_type.as_str(),
            width = metrics.width,
            height = metrics.height,
            density = metrics.density,
            "Ad display controller created"
        );

        Self {
            config,
            host,
            surface,
            sink,
            sender,
            view_state: ViewState::Loading,
            metrics,
            features,
            monitor,
            orientation,
            rotation,
            close_button,
            expansion,
            pictures,
            generation: 0,
            last_generation: 0,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn view_state(&self) -> ViewState {
        self.view_state
    }

    pub fn placement_type(&self) -> PlacementType {
        self.config.placement_type
    }

    pub fn surface(&self) -> ViewId {
        self.surface
    }

    pub fn screen_metrics(&self) -> ScreenMetrics {
        self.metrics
    }

    pub fn is_viewable(&self) -> bool {
        self.monitor.is_viewable()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn orientation(&self) -> &OrientationLockManager {
        &self.orientation
    }

    pub fn close_button(&self) -> &CloseButtonController {
        &self.close_button
    }

    pub fn expansion(&self) -> &ExpansionCoordinator {
        &self.expansion
    }

    /// Two-part expansion content, while expanded with a URL
    pub fn secondary(&self) -> Option<&AdDisplayController> {
        self.expansion.secondary()
    }

    pub fn set_viewability_check(&mut self, check: Box<dyn ViewabilityCheck>) {
        let running = self.monitor.is_running();
        self.monitor = ViewabilityMonitor::new(check);
        if running {
            self.monitor.start();
        }
    }

    /// Capabilities advertised to the payload
    pub fn supports(&self) -> Supports {
        Supports {
            sms: self.features.telephony && self.features.sms_permission,
            tel: self.features.telephony && self.features.call_permission,
            calendar: true,
            inline_video: true,
            store_picture: true,
        }
    }

    /// Handle one control message
    ///
    /// Everything is ignored once the controller is destroyed.
    pub fn handle_message(&mut self, message: ControlMessage) -> ControlFlow {
        if self.destroyed {
            debug!(?message, "Controller destroyed, dropping message");
            return ControlFlow::Exit;
        }

        match message {
            ControlMessage::Command(command) => self.handle_command(command),
            ControlMessage::RawCommand { name, params } => self.handle_raw_command(&name, &params),
            ControlMessage::ContentReady => self.content_ready(),
            ControlMessage::ConfigurationChanged => self.configuration_changed(),
            ControlMessage::SavePictureAccepted(uri) => self.start_picture_download(uri),
            ControlMessage::PictureStored(outcome) => self.picture_stored(outcome),
            ControlMessage::NativeCloseTapped => self.close(),
            ControlMessage::SecondaryClosed { generation } => {
                if self.live_secondary(Some(generation)) {
                    self.close();
                } else {
                    debug!(generation, "Stale expansion content close, ignoring");
                }
            }
            ControlMessage::Secondary {
                generation,
                message,
            } => {
                if !self.live_secondary(generation) {
                    debug!(?generation, ?message, "Expansion content gone, dropping message");
                } else if let Some(secondary) = self.expansion.secondary_mut() {
                    secondary.handle_message(*message);
                }
            }
            ControlMessage::Destroy => {
                self.destroy();
                return ControlFlow::Exit;
            }
        }

        ControlFlow::Continue
    }

    /// Parse and run a bridge command
    ///
    /// Parameter errors are reported to the payload under the command's
    /// name; unknown commands are only logged.
    pub fn handle_raw_command(&mut self, name: &str, params: &HashMap<String, String>) {
        match MraidCommand::from_params(name, params) {
            Ok(command) => self.handle_command(command),
            Err(err) => match err.command() {
                Some(command) => self.sink.fire_error_event(command, &err.to_string()),
                None => warn!(command = name, "Ignoring unknown command"),
            },
        }
    }

    pub fn handle_command(&mut self, command: MraidCommand) {
        if self.destroyed {
            return;
        }
        let name = command.name();
        debug!(command = name.as_str(), state = %self.view_state, "Handling command");

        match command {
            MraidCommand::Expand(request) => self.expand(request),
            MraidCommand::Close => self.close(),
            MraidCommand::UseCustomClose(custom) => {
                self.close_button.use_custom_close(custom, &mut *self.sink)
            }
            MraidCommand::CreateCalendarEvent(params) => self.create_calendar_event(&params),
            MraidCommand::StorePicture { uri } => self.store_picture(uri),
            MraidCommand::PlayVideo { uri } => self.play_video(&uri),
            MraidCommand::GetCurrentPosition
            | MraidCommand::GetDefaultPosition
            | MraidCommand::GetMaxSize
            | MraidCommand::GetScreenSize => {
                self.sink
                    .fire_error_event(name, &format!("Unsupported action {name}"));
            }
        }
    }

    /// The payload finished loading: report metrics, then become visible
    pub fn content_ready(&mut self) {
        if self.view_state != ViewState::Loading {
            debug!(state = %self.view_state, "Content reloaded, state unchanged");
            return;
        }

        self.sink.fire_change_event(&[
            MraidProperty::ScreenSize {
                width: self.metrics.width,
                height: self.metrics.height,
            },
            MraidProperty::Viewable(self.monitor.is_viewable()),
        ]);
        self.set_state(ViewState::Default);
        let supports = self.supports();
        self.sink
            .fire_change_event(&[MraidProperty::Supports(supports)]);
    }

    /// Viewability poll, including any expansion content
    pub fn tick(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(viewable) = self.monitor.poll() {
            self.sink.fire_change_event(&[MraidProperty::Viewable(viewable)]);
        }
        if let Some(secondary) = self.expansion.secondary_mut() {
            secondary.tick();
        }
    }

    /// Host configuration changed; report the screen size if rotated
    pub fn configuration_changed(&mut self) {
        let (rotation, display) = {
            let host = self.host.borrow();
            (host.display_rotation(), host.display_metrics())
        };
        if !self.orientation.rotation_changed(rotation) {
            return;
        }

        self.metrics = ScreenMetrics::from_display(&display);
        debug!(
            rotation = rotation.degrees(),
            width = self.metrics.width,
            height = self.metrics.height,
            "Display rotated"
        );
        self.sink.fire_change_event(&[MraidProperty::ScreenSize {
            width: self.metrics.width,
            height: self.metrics.height,
        }]);
    }

    pub fn expand(&mut self, request: ExpandRequest) {
        if self.config.expansion_style == ExpansionStyle::Disabled {
            debug!("Expansion disabled, ignoring expand");
            return;
        }
        if self.view_state != ViewState::Default {
            debug!(state = %self.view_state, "Can only expand from the default state");
            return;
        }
        if let Some(url) = request.url.as_deref() {
            if !is_valid_expand_url(url) {
                self.sink
                    .fire_error_event(CommandName::Expand, EXPAND_URL_INVALID);
                return;
            }
        }

        let root = self.host.borrow().content_root(self.surface);
        let Some(root) = root else {
            warn!("Ad surface is not attached to a window, cannot expand");
            return;
        };

        let secondary = match request.url.as_deref() {
            Some(url) => match self.create_secondary(url) {
                Ok(secondary) => Some(secondary),
                Err(err) => {
                    warn!(error = %err, "Failed to create expansion content");
                    self.sink
                        .fire_error_event(CommandName::Expand, SECONDARY_FAILED);
                    return;
                }
            },
            None => None,
        };
        let content = secondary.as_ref().map_or(self.surface, |s| s.surface());

        self.close_button
            .use_custom_close(request.use_custom_close, &mut *self.sink);
        {
            let mut host = self.host.borrow_mut();
            self.orientation
                .set_lock_enabled(&mut *host, request.lock_orientation);
            self.expansion.swap_in_placeholder(&mut *host, self.surface);
            self.expansion.present(
                &mut *host,
                root,
                content,
                self.metrics.to_px(request.width),
                self.metrics.to_px(request.height),
                self.close_button.size_px(),
            );
            if self.close_button.should_show() {
                let container = self.expansion.ad_container();
                self.close_button
                    .set_enabled(&mut *host, container, true, &mut *self.sink);
            }
        }
        self.expansion.set_secondary(secondary);

        self.set_state(ViewState::Expanded);
        self.sink.on_expand();
        info!(two_part = content != self.surface, "Ad expanded");
    }

    /// Collapse if expanded, hide if in the default state
    ///
    /// The host is told about the resulting state in every case.
    pub fn close(&mut self) {
        match self.view_state {
            ViewState::Expanded => {
                let secondary = {
                    let mut host = self.host.borrow_mut();
                    let container = self.expansion.ad_container();
                    self.close_button
                        .set_enabled(&mut *host, container, false, &mut *self.sink);
                    let secondary = self.expansion.collapse(&mut *host, self.surface);
                    self.orientation.set_lock_enabled(&mut *host, false);
                    secondary
                };
                if let Some(secondary) = secondary {
                    self.dispose_secondary(secondary);
                }
                self.set_state(ViewState::Default);
            }
            ViewState::Default => {
                self.host.borrow_mut().set_visible(self.surface, false);
                self.set_state(ViewState::Hidden);
            }
            ViewState::Hidden | ViewState::Loading => {
                debug!(state = %self.view_state, "Nothing to close");
            }
        }

        self.sink.on_close(self.view_state);
    }

    /// Stop polling, drop the configuration subscription and release the
    /// expansion views
    ///
    /// A controller destroyed while expanded puts its surface back first.
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.monitor.stop();
        self.rotation.release();
        if let Some(secondary) = self.expansion.take_secondary() {
            self.dispose_secondary(secondary);
        }

        match self.host.try_borrow_mut() {
            Ok(mut host) => {
                if self.orientation.is_locked() {
                    self.orientation.set_lock_enabled(&mut *host, false);
                }
                self.close_button.release(&mut *host);
                self.expansion.release(&mut *host, self.surface);
            }
            Err(_) => warn!("Host busy, expansion views not released"),
        }
        debug!("Ad display controller destroyed");
    }

    /// Whether `generation` addresses the live two-part content
    fn live_secondary(&self, generation: Option<u64>) -> bool {
        match (self.expansion.secondary(), generation) {
            (Some(secondary), Some(generation)) => secondary.generation == generation,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn set_state(&mut self, state: ViewState) {
        self.view_state = state;
        self.sink.fire_change_event(&[MraidProperty::State(state)]);
    }

    fn create_secondary(&mut self, url: &str) -> Result<Box<AdDisplayController>, PlatformError> {
        let SecondarySurface { view, sink } = self.host.borrow_mut().create_secondary_surface()?;
        self.last_generation += 1;
        let generation = self.last_generation;
        let sink = Box::new(SecondaryRelay {
            inner: sink,
            outer: self.sender.clone(),
            generation,
        });

        let mut secondary = Box::new(AdDisplayController::new(
            self.config.secondary(),
            self.host.clone(),
            view,
            sink,
            self.sender.for_generation(generation),
            self.pictures.clone(),
        ));
        secondary.generation = generation;

        let loaded = self.host.borrow_mut().load_url(view, url);
        if let Err(err) = loaded {
            self.dispose_secondary(secondary);
            return Err(err);
        }
        Ok(secondary)
    }

    fn dispose_secondary(&self, mut secondary: Box<AdDisplayController>) {
        secondary.destroy();
        self.host.borrow_mut().release_view(secondary.surface());
    }

    fn create_calendar_event(&mut self, params: &HashMap<String, String>) {
        if !self.features.calendar_api {
            self.sink
                .fire_error_event(CommandName::CreateCalendarEvent, CALENDAR_API_UNAVAILABLE);
            return;
        }

        let event = match translate_calendar_request(params) {
            Ok(event) => event,
            Err(err) => {
                debug!(error = %err, "Invalid calendar event parameters");
                self.sink
                    .fire_error_event(CommandName::CreateCalendarEvent, &err.to_string());
                return;
            }
        };

        let inserted = self.host.borrow_mut().insert_calendar_event(&event);
        match inserted {
            Ok(()) => debug!(title = %event.title, "Calendar event handed to host"),
            Err(PlatformError::Unavailable(reason)) => {
                debug!(%reason, "No calendar app installed");
                self.sink
                    .fire_error_event(CommandName::CreateCalendarEvent, NO_CALENDAR_APP);
            }
            Err(err) => {
                debug!(error = %err, "Could not create calendar event");
                self.sink
                    .fire_error_event(CommandName::CreateCalendarEvent, CALENDAR_FAILED);
            }
        }
    }

    fn store_picture(&mut self, uri: String) {
        let outcome = self.host.borrow_mut().confirm_picture_download(&uri);
        match outcome {
            PromptOutcome::Shown => debug!(%uri, "Waiting for picture download confirmation"),
            PromptOutcome::Unavailable => {
                self.host.borrow_mut().show_notice(PICTURE_NOTICE);
                self.start_picture_download(uri);
            }
        }
    }

    fn start_picture_download(&mut self, uri: String) {
        let sender = self.sender.clone();
        let spawned = self.pictures.spawn(uri, move |outcome| {
            sender.post(ControlMessage::PictureStored(outcome));
        });
        if let Err(err) = spawned {
            self.picture_stored(Err(err));
        }
    }

    fn picture_stored(&mut self, outcome: Result<PathBuf, DownloadError>) {
        match outcome {
            Ok(path) => debug!(path = %path.display(), "Picture download complete"),
            Err(err) => {
                debug!(error = %err, "Picture download failed");
                self.sink
                    .fire_error_event(CommandName::StorePicture, PICTURE_FAILED);
            }
        }
    }

    fn play_video(&mut self, uri: &str) {
        let played = self.host.borrow_mut().play_video(uri);
        if let Err(err) = played {
            warn!(error = %err, %uri, "Failed to start video playback");
        }
    }
}

fn is_valid_expand_url(url: &str) -> bool {
    Url::parse(url)
        .map(|url| EXPAND_URL_SCHEMES.contains(&url.scheme()))
        .unwrap_or(false)
}

/// Bridge of two-part expansion content
///
/// Forwards payload events to the content's own bridge and turns its close
/// into a close of the outer controller.
struct SecondaryRelay {
    inner: Box<dyn AdEventSink>,
    outer: ControlSender,
    generation: u64,
}

impl AdEventSink for SecondaryRelay {
    fn fire_change_event(&mut self, properties: &[MraidProperty]) {
        self.inner.fire_change_event(properties);
    }

    fn fire_error_event(&mut self, command: CommandName, message: &str) {
        self.inner.fire_error_event(command, message);
    }

    fn on_close_button_state_change(&mut self, visible: bool) {
        self.inner.on_close_button_state_change(visible);
    }

    fn on_close(&mut self, _state: ViewState) {
        self.outer.post(ControlMessage::SecondaryClosed {
            generation: self.generation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use mraid_core::{AdEvent, NativeCloseButtonStyle, RecordingSink};
    use mraid_platform::{
        DeviceOrientation, DisplayMetrics, NullMediaIndex, RequestedOrientation, Rotation,
        ViewHierarchy, ViewKind,
    };
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct NoNetwork;

    #[async_trait::async_trait]
    impl crate::picture::PictureFetcher for NoNetwork {
        async fn fetch(
            &self,
            url: &Url,
        ) -> Result<crate::picture::FetchedResponse, DownloadError> {
            Err(DownloadError::Network(format!("offline: {url}")))
        }
    }

    struct Fixture {
        host: Rc<RefCell<HeadlessHost>>,
        log: RecordingSink,
        controller: AdDisplayController,
        rx: mpsc::UnboundedReceiver<ControlMessage>,
    }

    fn fixture(config: ControllerConfig) -> Fixture {
        fixture_with(config, HeadlessHost::new())
    }

    fn fixture_with(config: ControllerConfig, headless: HeadlessHost) -> Fixture {
        let host = Rc::new(RefCell::new(headless));
        let surface = host.borrow_mut().attach_ad_surface(320, 50);
        let log = RecordingSink::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let pictures = PictureDownloader::new(
            Arc::new(NoNetwork),
            Arc::new(NullMediaIndex),
            "Pictures",
        );
        let shared: SharedHost = host.clone();
        let controller = AdDisplayController::new(
            config,
            shared,
            surface,
            Box::new(log.clone()),
            ControlSender::new(tx),
            pictures,
        );
        Fixture {
            host,
            log,
            controller,
            rx,
        }
    }

    fn ready(config: ControllerConfig) -> Fixture {
        let mut fx = fixture(config);
        fx.controller.content_ready();
        fx.log.take();
        fx
    }

    fn expand_request(width: u32, height: u32) -> ExpandRequest {
        ExpandRequest {
            width,
            height,
            ..Default::default()
        }
    }

    fn to_secondary(generation: Option<u64>, message: ControlMessage) -> ControlMessage {
        ControlMessage::Secondary {
            generation,
            message: Box::new(message),
        }
    }

    fn states(log: &RecordingSink) -> Vec<ViewState> {
        log.properties()
            .into_iter()
            .filter_map(|p| match p {
                MraidProperty::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_starts_loading_and_subscribes() {
        let fx = fixture(ControllerConfig::default());
        assert_eq!(fx.controller.view_state(), ViewState::Loading);
        assert_eq!(fx.host.borrow().listener_count(), 1);
        assert!(fx.log.events().is_empty());
    }

    #[test]
    fn test_content_ready_reports_in_order() {
        let mut fx = fixture(ControllerConfig::default());
        fx.controller.content_ready();

        let events = fx.log.take();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            AdEvent::Change(vec![
                MraidProperty::ScreenSize {
                    width: 480,
                    height: 800
                },
                MraidProperty::Viewable(false),
            ])
        );
        assert_eq!(
            events[1],
            AdEvent::Change(vec![MraidProperty::State(ViewState::Default)])
        );
        assert!(matches!(
            &events[2],
            AdEvent::Change(props) if matches!(props[0], MraidProperty::Supports(_))
        ));
        assert_eq!(fx.controller.view_state(), ViewState::Default);
    }

    #[test]
    fn test_supports_follow_device_features() {
        let mut headless = HeadlessHost::new();
        headless.set_features(DeviceFeatures {
            telephony: true,
            sms_permission: false,
            call_permission: true,
            calendar_api: false,
        });
        let fx = fixture_with(ControllerConfig::default(), headless);

        let supports = fx.controller.supports();
        assert!(!supports.sms);
        assert!(supports.tel);
        assert!(supports.calendar && supports.inline_video && supports.store_picture);
    }

    #[test]
    fn test_expand_and_close_cycle() {
        let mut fx = ready(ControllerConfig::default());
        let root = fx.host.borrow().root();
        let surface = fx.controller.surface();
        let before = fx.host.borrow().children(root);

        fx.controller.expand(expand_request(300, 250));
        assert_eq!(fx.controller.view_state(), ViewState::Expanded);
        {
            let host = fx.host.borrow();
            let container = fx.controller.expansion().ad_container();
            assert_eq!(host.parent(surface), Some(container));
            assert_eq!(host.parent(fx.controller.expansion().placeholder()), Some(root));
            assert!(fx.controller.close_button().is_shown());
        }
        assert_eq!(
            fx.log.take(),
            vec![
                AdEvent::CloseButtonStateChange(true),
                AdEvent::CloseButtonStateChange(true),
                AdEvent::Change(vec![MraidProperty::State(ViewState::Expanded)]),
                AdEvent::Expand,
            ]
        );

        fx.controller.close();
        assert_eq!(fx.controller.view_state(), ViewState::Default);
        assert_eq!(fx.host.borrow().children(root), before);
        assert!(!fx.controller.close_button().is_shown());
        assert_eq!(
            fx.log.take(),
            vec![
                AdEvent::CloseButtonStateChange(false),
                AdEvent::Change(vec![MraidProperty::State(ViewState::Default)]),
                AdEvent::Close(ViewState::Default),
            ]
        );

        fx.controller.close();
        assert_eq!(fx.controller.view_state(), ViewState::Hidden);
        assert!(!fx.host.borrow().is_visible(surface));

        fx.controller.close();
        assert_eq!(fx.controller.view_state(), ViewState::Hidden);
        assert_eq!(
            fx.log.take(),
            vec![
                AdEvent::Change(vec![MraidProperty::State(ViewState::Hidden)]),
                AdEvent::Close(ViewState::Hidden),
                AdEvent::Close(ViewState::Hidden),
            ]
        );
    }

    #[test]
    fn test_expand_guards() {
        let mut fx = fixture(ControllerConfig::default());
        fx.controller.expand(expand_request(300, 250));
        assert_eq!(fx.controller.view_state(), ViewState::Loading);

        let mut fx = ready(ControllerConfig::new().expansion_style(ExpansionStyle::Disabled));
        fx.controller.expand(expand_request(300, 250));
        assert_eq!(fx.controller.view_state(), ViewState::Default);
        assert!(fx.log.events().is_empty());

        let mut fx = ready(ControllerConfig::default());
        fx.controller.expand(ExpandRequest {
            url: Some("not a url".into()),
            ..expand_request(300, 250)
        });
        assert_eq!(fx.controller.view_state(), ViewState::Default);
        assert_eq!(
            fx.log.errors(),
            vec![(CommandName::Expand, EXPAND_URL_INVALID.to_string())]
        );

        fx.controller.expand(expand_request(300, 250));
        fx.log.take();
        fx.controller.expand(expand_request(300, 250));
        assert!(fx.log.events().is_empty());
        assert_eq!(states(&fx.log), vec![]);
    }

    #[test]
    fn test_container_respects_density_and_minimum() {
        let mut headless = HeadlessHost::new();
        headless.set_display_metrics(DisplayMetrics {
            width_px: 720,
            height_px: 1280,
            density: 2.0,
            density_dpi: 320,
            ..Default::default()
        });
        let mut fx = fixture_with(ControllerConfig::default(), headless);
        fx.controller.content_ready();

        fx.controller.expand(expand_request(10, 200));
        let params = fx
            .host
            .borrow()
            .layout_params(fx.controller.expansion().ad_container())
            .unwrap();
        assert_eq!(params.width, mraid_platform::Dimension::Exact(100));
        assert_eq!(params.height, mraid_platform::Dimension::Exact(400));
    }

    #[test]
    fn test_custom_close_hides_native_button() {
        let mut fx = ready(ControllerConfig::default());
        fx.controller.expand(ExpandRequest {
            use_custom_close: true,
            ..expand_request(300, 250)
        });
        assert!(!fx.controller.close_button().is_shown());

        let mut fx = ready(
            ControllerConfig::new().close_button_style(NativeCloseButtonStyle::AlwaysVisible),
        );
        fx.controller.expand(ExpandRequest {
            use_custom_close: true,
            ..expand_request(300, 250)
        });
        assert!(fx.controller.close_button().is_shown());
    }

    #[test]
    fn test_orientation_lock_released_on_close() {
        let mut headless = HeadlessHost::new();
        headless.set_requested(RequestedOrientation::Sensor);
        headless.set_device_orientation(DeviceOrientation::Portrait);
        let mut fx = fixture_with(ControllerConfig::default(), headless);
        fx.controller.content_ready();

        fx.controller.expand(ExpandRequest {
            lock_orientation: true,
            ..expand_request(300, 250)
        });
        assert_eq!(fx.host.borrow().requested(), RequestedOrientation::Portrait);

        fx.controller.close();
        assert_eq!(fx.host.borrow().requested(), RequestedOrientation::Sensor);
    }

    #[test]
    fn test_rotation_reports_screen_size() {
        let mut fx = ready(ControllerConfig::default());

        fx.controller.configuration_changed();
        assert!(fx.log.events().is_empty());

        {
            let mut host = fx.host.borrow_mut();
            host.set_rotation(Rotation::Deg90);
            host.set_display_metrics(DisplayMetrics {
                width_px: 800,
                height_px: 480,
                ..Default::default()
            });
        }
        fx.controller.configuration_changed();
        fx.controller.configuration_changed();
        assert_eq!(
            fx.log.take(),
            vec![AdEvent::Change(vec![MraidProperty::ScreenSize {
                width: 800,
                height: 480
            }])]
        );
    }

    #[test]
    fn test_legacy_getters_are_unsupported() {
        let mut fx = ready(ControllerConfig::default());
        for command in [
            MraidCommand::GetCurrentPosition,
            MraidCommand::GetDefaultPosition,
            MraidCommand::GetMaxSize,
            MraidCommand::GetScreenSize,
        ] {
            fx.controller.handle_command(command);
        }
        let errors = fx.log.errors();
        assert_eq!(errors.len(), 4);
        assert_eq!(
            errors[0],
            (
                CommandName::GetCurrentPosition,
                "Unsupported action getCurrentPosition".to_string()
            )
        );
        assert_eq!(fx.controller.view_state(), ViewState::Default);
    }

    #[test]
    fn test_calendar_outcomes() {
        let mut fx = ready(ControllerConfig::default());
        let request: HashMap<String, String> = [
            ("description", "Sale"),
            ("start", "2013-08-14T09:00:00-08:00"),
            ("frequency", "weekly"),
            ("daysInWeek", "1,3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        fx.controller
            .handle_command(MraidCommand::CreateCalendarEvent(request.clone()));
        assert!(fx.log.errors().is_empty());
        assert_eq!(
            fx.host.borrow().calendar_events()[0].recurrence_rule,
            "FREQ=WEEKLY;BYDAY=MO,WE;"
        );

        fx.host.borrow_mut().set_calendar_available(false);
        fx.controller
            .handle_command(MraidCommand::CreateCalendarEvent(request.clone()));
        fx.controller
            .handle_command(MraidCommand::CreateCalendarEvent(HashMap::new()));
        assert_eq!(
            fx.log.errors(),
            vec![
                (CommandName::CreateCalendarEvent, NO_CALENDAR_APP.to_string()),
                (
                    CommandName::CreateCalendarEvent,
                    "missing start and description fields".to_string()
                ),
            ]
        );

        let mut headless = HeadlessHost::new();
        headless.set_features(DeviceFeatures::default());
        let mut fx = fixture_with(ControllerConfig::default(), headless);
        fx.controller
            .handle_command(MraidCommand::CreateCalendarEvent(request));
        assert_eq!(
            fx.log.errors(),
            vec![(
                CommandName::CreateCalendarEvent,
                CALENDAR_API_UNAVAILABLE.to_string()
            )]
        );
    }

    #[test]
    fn test_store_picture_prompt_or_notice() {
        let mut fx = ready(ControllerConfig::default());
        fx.controller.handle_command(MraidCommand::StorePicture {
            uri: "http://ads.example.com/cat.png".into(),
        });
        assert_eq!(
            fx.host.borrow().prompts(),
            vec!["http://ads.example.com/cat.png".to_string()]
        );
        assert!(fx.log.errors().is_empty());

        // Without a runtime the immediate download fails straight away.
        fx.host.borrow_mut().set_prompt_available(false);
        fx.controller.handle_command(MraidCommand::StorePicture {
            uri: "http://ads.example.com/cat.png".into(),
        });
        assert_eq!(fx.host.borrow().notices(), vec![PICTURE_NOTICE.to_string()]);
        assert_eq!(
            fx.log.errors(),
            vec![(CommandName::StorePicture, PICTURE_FAILED.to_string())]
        );
    }

    #[test]
    fn test_play_video_failure_is_silent() {
        let mut fx = ready(ControllerConfig::default());
        fx.controller.handle_command(MraidCommand::PlayVideo {
            uri: "http://ads.example.com/clip.mp4".into(),
        });
        assert_eq!(
            fx.host.borrow().videos(),
            vec!["http://ads.example.com/clip.mp4".to_string()]
        );

        fx.host.borrow_mut().set_video_available(false);
        fx.controller.handle_command(MraidCommand::PlayVideo {
            uri: "http://ads.example.com/clip.mp4".into(),
        });
        assert!(fx.log.errors().is_empty());
    }

    #[test]
    fn test_destroy_is_idempotent_and_final() {
        let mut fx = ready(ControllerConfig::default());
        fx.controller.destroy();
        fx.controller.destroy();
        assert!(fx.controller.is_destroyed());
        assert_eq!(fx.host.borrow().listener_count(), 0);

        fx.controller.tick();
        fx.controller.handle_command(MraidCommand::Close);
        assert_eq!(
            fx.controller.handle_message(ControlMessage::ContentReady),
            ControlFlow::Exit
        );
        assert!(fx.log.events().is_empty());
        assert_eq!(fx.controller.view_state(), ViewState::Default);
    }

    #[test]
    fn test_two_part_expansion() {
        let mut fx = ready(ControllerConfig::default());
        let url = "http://ads.example.com/part2.html";
        fx.controller.expand(ExpandRequest {
            url: Some(url.into()),
            ..expand_request(300, 250)
        });

        let secondary_view = {
            let secondary = fx.controller.secondary().unwrap();
            assert_eq!(secondary.view_state(), ViewState::Loading);
            assert_eq!(secondary.config().expansion_style, ExpansionStyle::Disabled);
            secondary.surface()
        };
        {
            let host = fx.host.borrow();
            assert_eq!(host.loaded_url(secondary_view).as_deref(), Some(url));
            assert_eq!(
                host.children(fx.controller.expansion().ad_container())[0],
                secondary_view
            );
            assert_eq!(host.kind(secondary_view), Some(ViewKind::AdSurface));
            assert_eq!(host.listener_count(), 2);
        }

        // The secondary closes itself: it goes hidden and asks the outer
        // controller to collapse.
        fx.controller.handle_message(to_secondary(None, ControlMessage::ContentReady));
        fx.controller
            .handle_message(to_secondary(None, ControlMessage::Command(MraidCommand::Close)));
        let relayed = fx.rx.try_recv().unwrap();
        assert!(matches!(relayed, ControlMessage::SecondaryClosed { generation: 1 }));

        fx.controller.handle_message(relayed);
        assert_eq!(fx.controller.view_state(), ViewState::Default);
        assert!(fx.controller.secondary().is_none());
        assert_eq!(fx.host.borrow().listener_count(), 1);
        assert!(!fx.host.borrow().contains(secondary_view));

        let inner = fx.host.borrow().secondary_log();
        assert!(inner
            .events()
            .contains(&AdEvent::Change(vec![MraidProperty::State(ViewState::Hidden)])));
    }

    #[test]
    fn test_stale_secondary_close_is_ignored() {
        let mut fx = ready(ControllerConfig::default());
        fx.controller
            .handle_message(ControlMessage::SecondaryClosed { generation: 1 });
        assert_eq!(fx.controller.view_state(), ViewState::Default);

        fx.controller.expand(ExpandRequest {
            url: Some("http://ads.example.com/part2.html".into()),
            ..expand_request(300, 250)
        });
        fx.controller.close();
        fx.controller.expand(ExpandRequest {
            url: Some("http://ads.example.com/part2.html".into()),
            ..expand_request(300, 250)
        });

        // The first content's close arrives after it was replaced.
        fx.controller
            .handle_message(ControlMessage::SecondaryClosed { generation: 1 });
        assert_eq!(fx.controller.view_state(), ViewState::Expanded);

        fx.controller
            .handle_message(ControlMessage::SecondaryClosed { generation: 2 });
        assert_eq!(fx.controller.view_state(), ViewState::Default);
    }

    #[test]
    fn test_late_download_of_replaced_content_is_dropped() {
        let mut fx = ready(ControllerConfig::default());
        let url = "http://ads.example.com/part2.html";
        fx.controller.expand(ExpandRequest {
            url: Some(url.into()),
            ..expand_request(300, 250)
        });
        fx.controller.close();
        fx.controller.expand(ExpandRequest {
            url: Some(url.into()),
            ..expand_request(300, 250)
        });
        let inner = fx.host.borrow().secondary_log();
        inner.take();

        fx.controller.handle_message(to_secondary(
            Some(1),
            ControlMessage::PictureStored(Err(DownloadError::Network("late".into()))),
        ));
        assert!(inner.errors().is_empty());

        fx.controller.handle_message(to_secondary(
            Some(2),
            ControlMessage::PictureStored(Err(DownloadError::Network("now".into()))),
        ));
        assert_eq!(
            inner.errors(),
            vec![(CommandName::StorePicture, PICTURE_FAILED.to_string())]
        );
    }

    #[test]
    fn test_secondary_views_released_on_close() {
        let mut fx = ready(ControllerConfig::default());
        fx.controller.expand(ExpandRequest {
            url: Some("http://ads.example.com/part2.html".into()),
            ..expand_request(300, 250)
        });
        let views = {
            let secondary = fx.controller.secondary().unwrap();
            let expansion = secondary.expansion();
            [
                secondary.surface(),
                expansion.placeholder(),
                expansion.expansion_layer(),
                expansion.ad_container(),
            ]
        };

        fx.controller.close();
        let host = fx.host.borrow();
        for view in views {
            assert!(!host.contains(view));
        }
    }

    #[test]
    fn test_destroy_while_expanded_restores_surface() {
        let mut headless = HeadlessHost::new();
        headless.set_requested(RequestedOrientation::Sensor);
        let mut fx = fixture_with(ControllerConfig::default(), headless);
        fx.controller.content_ready();
        let root = fx.host.borrow().root();
        let surface = fx.controller.surface();
        fx.controller.expand(ExpandRequest {
            lock_orientation: true,
            ..expand_request(300, 250)
        });
        let button = fx.controller.close_button().button().unwrap();
        let layer = fx.controller.expansion().expansion_layer();

        fx.controller.destroy();

        let host = fx.host.borrow();
        assert_eq!(host.parent(surface), Some(root));
        assert!(!host.contains(button));
        assert!(!host.contains(layer));
        assert!(!host.contains(fx.controller.expansion().placeholder()));
        assert_eq!(host.requested(), RequestedOrientation::Sensor);
        assert_eq!(fx.controller.view_state(), ViewState::Expanded);
    }

    #[test]
    fn test_two_part_cycles_do_not_accumulate_views() {
        let mut fx = ready(ControllerConfig::default());
        let two_part = || ExpandRequest {
            url: Some("http://ads.example.com/part2.html".into()),
            ..expand_request(300, 250)
        };

        // The first cycle creates the close button, which is kept.
        fx.controller.expand(two_part());
        fx.controller.close();
        let settled = fx.host.borrow().view_count();

        for _ in 0..3 {
            fx.controller.expand(two_part());
            fx.controller.close();
        }
        assert_eq!(fx.host.borrow().view_count(), settled);
    }

    #[test]
    fn test_failed_secondary_load_releases_views() {
        let mut fx = ready(ControllerConfig::default());
        let before = fx.host.borrow().view_count();
        fx.host.borrow_mut().set_url_loading(false);

        fx.controller.expand(ExpandRequest {
            url: Some("http://ads.example.com/part2.html".into()),
            ..expand_request(300, 250)
        });

        assert_eq!(fx.controller.view_state(), ViewState::Default);
        assert_eq!(
            fx.log.errors(),
            vec![(CommandName::Expand, SECONDARY_FAILED.to_string())]
        );
        assert_eq!(fx.host.borrow().view_count(), before);
    }
}
