use tracing::{debug, info, trace};

use super::connection::ConnectionController;
use super::model::{ConnectionState, DeviceInfo};
use super::registry::DeviceRegistry;
use crate::error::SessionError;
use crate::transport::Transport;

/// When a scan stops accepting devices.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum DiscoveryPolicy {
    /// Cancel the scan as soon as one device has been found.
    #[default]
    FirstMatch,
    /// Keep collecting devices until the transport ends the scan.
    Exhaustive,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ScanPhase {
    Idle,
    Scanning,
    Cancelling,
}

/// Runs scans and collects their results into a [`DeviceRegistry`].
#[derive(Debug)]
pub struct DiscoverySession {
    policy: DiscoveryPolicy,
    registry: DeviceRegistry,
    phase: ScanPhase,
    // Scans requested whose completion has not arrived yet.
    pending_completions: usize,
}

impl DiscoverySession {
    pub(crate) fn new(policy: DiscoveryPolicy) -> Self {
        Self {
            policy,
            registry: DeviceRegistry::default(),
            phase: ScanPhase::Idle,
            pending_completions: 0,
        }
    }

    /// Returns the devices found by the latest scan.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Returns whether the transport is still delivering results for a scan.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.phase == ScanPhase::Scanning
    }

    /// Clears previous results and starts a new scan.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyInProgress`] while discovering and
    /// [`SessionError::InvalidState`] while a device link is active.
    pub fn start(
        &mut self,
        controller: &mut ConnectionController,
        transport: &dyn Transport,
    ) -> Result<(), SessionError> {
        match controller.state() {
            ConnectionState::Discovering => return Err(SessionError::AlreadyInProgress),
            state if state.is_linked() => {
                return Err(SessionError::InvalidState {
                    operation: "start discovery",
                    state,
                });
            }
            _ => {}
        }

        self.registry.clear();
        self.phase = ScanPhase::Scanning;
        self.pending_completions += 1;
        controller.enter_discovering();
        info!(policy = ?self.policy, "starting discovery");
        transport.request_discovery();
        Ok(())
    }

    /// Records a device reported by the transport.
    ///
    /// Returns the device when it was newly added to the registry.
    pub fn on_device_found(
        &mut self,
        device: DeviceInfo,
        controller: &mut ConnectionController,
        transport: &dyn Transport,
    ) -> Option<DeviceInfo> {
        if self.phase != ScanPhase::Scanning {
            trace!(device = %device.id(), "ignoring device outside an accepting scan");
            return None;
        }
        if !self.registry.insert(device.clone()) {
            trace!(device = %device.id(), "ignoring duplicate discovery");
            return None;
        }

        info!(device = %device.id(), name = device.display_name(), "discovered device");
        if self.policy == DiscoveryPolicy::FirstMatch {
            self.phase = ScanPhase::Cancelling;
            transport.cancel_discovery();
            controller.enter_discovered();
        }
        Some(device)
    }

    /// Handles the end of a scan.
    ///
    /// Returns whether anything was found, or `None` when the completion
    /// belongs to a scan that has since been superseded.
    pub fn on_scan_complete(
        &mut self,
        count: usize,
        controller: &mut ConnectionController,
    ) -> Option<bool> {
        match self.pending_completions {
            0 => {
                debug!(count, "ignoring unsolicited scan completion");
                return None;
            }
            1 => {}
            _ => {
                self.pending_completions -= 1;
                debug!(count, "ignoring completion of a superseded scan");
                return None;
            }
        }

        self.pending_completions = 0;
        self.phase = ScanPhase::Idle;
        let found = !self.registry.is_empty();
        if controller.state() == ConnectionState::Discovering {
            if found {
                controller.enter_discovered();
            } else {
                controller.enter_idle();
            }
        }
        info!(count, found, "discovery complete");
        Some(found)
    }

    /// Asks the transport to stop the running scan.
    ///
    /// Returns `false` when no scan is accepting devices.
    pub fn cancel(&mut self, transport: &dyn Transport) -> bool {
        if self.phase != ScanPhase::Scanning {
            return false;
        }
        self.phase = ScanPhase::Cancelling;
        transport.cancel_discovery();
        true
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::session::DeviceId;
    use crate::transport::{RecordingTransport, TransportRequest};

    fn device(id: u32) -> DeviceInfo {
        DeviceInfo::new(DeviceId::new(id), Some(format!("PIP-{id}")))
    }

    fn started(
        policy: DiscoveryPolicy,
    ) -> (DiscoverySession, ConnectionController, RecordingTransport) {
        let mut discovery = DiscoverySession::new(policy);
        let mut controller = ConnectionController::default();
        let transport = RecordingTransport::new();
        discovery
            .start(&mut controller, &transport)
            .expect("discovery should start from idle");
        (discovery, controller, transport)
    }

    #[test]
    fn start_requests_scan_and_enters_discovering() {
        let (_discovery, controller, transport) = started(DiscoveryPolicy::FirstMatch);

        assert_eq!(ConnectionState::Discovering, controller.state());
        assert_eq!(vec![TransportRequest::Discovery], transport.requests());
    }

    #[test]
    fn start_while_discovering_is_rejected() {
        let (mut discovery, mut controller, transport) = started(DiscoveryPolicy::FirstMatch);

        let result = discovery.start(&mut controller, &transport);

        assert_eq!(Err(SessionError::AlreadyInProgress), result);
        assert_eq!(1, transport.count(TransportRequest::Discovery));
    }

    #[test]
    fn first_match_cancels_once_and_stops_inserting() {
        let (mut discovery, mut controller, transport) = started(DiscoveryPolicy::FirstMatch);

        let first = discovery.on_device_found(device(7), &mut controller, &transport);
        let repeat = discovery.on_device_found(device(7), &mut controller, &transport);
        let other = discovery.on_device_found(device(9), &mut controller, &transport);

        assert_eq!(Some(device(7)), first);
        assert_eq!(None, repeat);
        assert_eq!(None, other);
        assert_eq!(1, discovery.registry().len());
        assert_eq!(1, transport.count(TransportRequest::CancelDiscovery));
        assert_eq!(ConnectionState::Discovered, controller.state());
    }

    #[test]
    fn exhaustive_policy_collects_until_completion() {
        let (mut discovery, mut controller, transport) = started(DiscoveryPolicy::Exhaustive);

        for id in [7, 9, 7, 11] {
            discovery.on_device_found(device(id), &mut controller, &transport);
        }
        assert_eq!(ConnectionState::Discovering, controller.state());

        let found = discovery.on_scan_complete(3, &mut controller);

        assert_eq!(Some(true), found);
        assert_eq!(3, discovery.registry().len());
        assert_eq!(0, transport.count(TransportRequest::CancelDiscovery));
        assert_eq!(ConnectionState::Discovered, controller.state());
    }

    #[rstest]
    #[case(DiscoveryPolicy::FirstMatch)]
    #[case(DiscoveryPolicy::Exhaustive)]
    fn empty_scan_returns_to_idle(#[case] policy: DiscoveryPolicy) {
        let (mut discovery, mut controller, _transport) = started(policy);

        let found = discovery.on_scan_complete(0, &mut controller);

        assert_eq!(Some(false), found);
        assert_eq!(ConnectionState::Idle, controller.state());
    }

    #[test]
    fn completion_after_match_keeps_discovered() {
        let (mut discovery, mut controller, transport) = started(DiscoveryPolicy::FirstMatch);
        discovery.on_device_found(device(7), &mut controller, &transport);

        let found = discovery.on_scan_complete(1, &mut controller);

        assert_eq!(Some(true), found);
        assert_eq!(ConnectionState::Discovered, controller.state());
    }

    #[test]
    fn completion_of_superseded_scan_is_ignored() {
        let (mut discovery, mut controller, transport) = started(DiscoveryPolicy::FirstMatch);
        discovery.on_device_found(device(7), &mut controller, &transport);
        discovery
            .start(&mut controller, &transport)
            .expect("rescan should be allowed once discovered");

        let stale = discovery.on_scan_complete(1, &mut controller);
        assert_eq!(None, stale);
        assert_eq!(ConnectionState::Discovering, controller.state());
        assert!(discovery.registry().is_empty());

        let current = discovery.on_scan_complete(0, &mut controller);
        assert_eq!(Some(false), current);
        assert_eq!(ConnectionState::Idle, controller.state());
    }

    #[test]
    fn cancel_is_idempotent() {
        let (mut discovery, _controller, transport) = started(DiscoveryPolicy::Exhaustive);

        assert!(discovery.cancel(&transport));
        assert!(!discovery.cancel(&transport));
        assert_eq!(1, transport.count(TransportRequest::CancelDiscovery));
    }

    #[test]
    fn start_during_active_link_is_rejected() {
        let mut discovery = DiscoverySession::new(DiscoveryPolicy::FirstMatch);
        let mut controller = ConnectionController::default();
        let transport = RecordingTransport::new();
        discovery
            .start(&mut controller, &transport)
            .expect("discovery should start");
        discovery.on_device_found(device(7), &mut controller, &transport);
        controller
            .connect(DeviceId::new(7), &transport)
            .expect("connect should be accepted");

        let result = discovery.start(&mut controller, &transport);

        assert_matches!(
            result,
            Err(SessionError::InvalidState {
                state: ConnectionState::Connecting,
                ..
            })
        );
    }
}
