use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use secrecy::SecretString;

use crate::config;
use crate::error::{WifiError, WifiResult};
use crate::wifi::WifiManager;
use crate::wifi::profile::ProfileSpec;
use crate::wifi::types::ConnectOutcome;

/// Supplies a credential when connecting to a network without a saved
/// profile. Returning `None` means the user declined, which ends the
/// attempt as [`ConnectOutcome::Cancelled`].
pub trait CredentialPrompt {
    fn request(&self, ssid: &str) -> Option<SecretString>;
}

/// Timing knobs for one connect attempt.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions {
    /// How long to wait for the association before giving up.
    pub timeout: Duration,
    /// Pause between connection-state polls.
    pub poll_interval: Duration,
    /// Pause after registering a fresh profile before using it.
    pub registration_delay: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(config::CONNECT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(config::CONNECT_POLL_INTERVAL_MS),
            registration_delay: Duration::from_millis(config::PROFILE_REGISTRATION_DELAY_MS),
        }
    }
}

/// Cancellation flag with a timed wait. The orchestrator sleeps on it
/// between polls, so another thread holding a clone can abort a connect
/// that would otherwise block until the timeout.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, condvar) = &*self.inner;
        *flag.lock().unwrap() = true;
        condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap()
    }

    /// Sleep for `duration` unless cancelled first; returns true when the
    /// token fired.
    fn wait(&self, duration: Duration) -> bool {
        let (flag, condvar) = &*self.inner;
        let guard = flag.lock().unwrap();
        let (guard, _timeout) = condvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap();
        *guard
    }
}

impl WifiManager {
    /// SSID of the current association, or `None` when not associated.
    pub fn current_ssid(&self) -> WifiResult<Option<String>> {
        self.backend().current_ssid()
    }

    /// True when the device is currently associated with `ssid`.
    pub fn is_connected(&self, ssid: &str) -> WifiResult<bool> {
        Ok(self.current_ssid()?.as_deref() == Some(ssid))
    }

    /// Connect to `ssid`, blocking until a terminal outcome.
    ///
    /// Already connected is an idempotent success. A saved profile is used
    /// as-is when no credential was supplied; otherwise the prompt is asked
    /// for one, and a fresh profile is registered with the platform before
    /// connecting. The attempt then polls the association state at
    /// `options.poll_interval` until it sees the SSID or `options.timeout`
    /// elapses. Platform command failures end the attempt as `Failed`;
    /// only an unusable platform (or undecodable output) is an `Err`.
    pub fn connect(
        &self,
        ssid: &str,
        credential: Option<SecretString>,
        prompt: &dyn CredentialPrompt,
        options: ConnectOptions,
        cancel: &CancelToken,
    ) -> WifiResult<ConnectOutcome> {
        if self.is_connected(ssid)? {
            tracing::info!(ssid, "already connected");
            return Ok(ConnectOutcome::Connected);
        }

        let saved = self.find_profile(ssid)?;
        let credential = match credential {
            Some(credential) => Some(credential),
            None if saved.is_some() => None,
            None => match prompt.request(ssid) {
                Some(credential) => Some(credential),
                None => {
                    tracing::warn!(ssid, "connection cancelled by the user");
                    return Ok(ConnectOutcome::Cancelled);
                }
            },
        };

        if let Some(credential) = credential {
            let profile = ProfileSpec::protected(ssid, credential);
            match self.backend().register_profile(&profile) {
                Ok(()) => {}
                Err(error @ WifiError::CommandFailed { .. }) => {
                    tracing::error!(ssid, %error, "profile registration rejected");
                    return Ok(ConnectOutcome::Failed(error.to_string()));
                }
                Err(error) => return Err(error),
            }
            // Give the platform a moment to take the profile before using it
            if cancel.wait(options.registration_delay) {
                return Ok(ConnectOutcome::Cancelled);
            }
        } else {
            tracing::info!(ssid, "connecting with saved profile");
        }

        match self.backend().connect_network(ssid) {
            Ok(()) => {}
            Err(error @ WifiError::CommandFailed { .. }) => {
                tracing::error!(ssid, %error, "platform connect failed");
                return Ok(ConnectOutcome::Failed(error.to_string()));
            }
            Err(error) => return Err(error),
        }

        self.wait_for_connection(ssid, options, cancel)
    }

    /// Disconnect from `ssid`. Returns false without touching the platform
    /// when the device is not connected to that network. The platform
    /// disconnect is treated as immediate and is not polled.
    pub fn disconnect(&self, ssid: &str) -> WifiResult<bool> {
        if !self.is_connected(ssid)? {
            tracing::info!(ssid, "not connected");
            return Ok(false);
        }
        self.backend().disconnect_network(ssid)?;
        tracing::info!(ssid, "disconnected");
        Ok(true)
    }

    fn wait_for_connection(
        &self,
        ssid: &str,
        options: ConnectOptions,
        cancel: &CancelToken,
    ) -> WifiResult<ConnectOutcome> {
        let start = Instant::now();
        while start.elapsed() < options.timeout {
            if self.is_connected(ssid)? {
                tracing::info!(ssid, "connected");
                return Ok(ConnectOutcome::Connected);
            }
            if cancel.wait(options.poll_interval) {
                tracing::warn!(ssid, "connect attempt cancelled mid-poll");
                return Ok(ConnectOutcome::Cancelled);
            }
        }
        tracing::warn!(ssid, timeout = ?options.timeout, "connect attempt timed out");
        Ok(ConnectOutcome::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wifi::backend::NetworkBackend;
    use crate::wifi::types::NetworkRecord;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct MockState {
        current: RefCell<Option<String>>,
        saved: RefCell<Vec<String>>,
        /// When set, `connect_network` makes its SSID the current one.
        connect_succeeds: Cell<bool>,
        /// When set, `connect_network` fails with a command error.
        connect_rejects: Cell<bool>,
        current_calls: Cell<usize>,
        connect_calls: Cell<usize>,
        register_calls: Cell<usize>,
        disconnect_calls: Cell<usize>,
    }

    struct MockBackend(Rc<MockState>);

    impl MockBackend {
        fn new() -> (Self, Rc<MockState>) {
            let state = Rc::new(MockState::default());
            (Self(Rc::clone(&state)), state)
        }
    }

    impl NetworkBackend for MockBackend {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn list_networks(&self) -> WifiResult<Vec<NetworkRecord>> {
            Ok(Vec::new())
        }

        fn current_ssid(&self) -> WifiResult<Option<String>> {
            self.0.current_calls.set(self.0.current_calls.get() + 1);
            Ok(self.0.current.borrow().clone())
        }

        fn saved_profiles(&self) -> WifiResult<Vec<String>> {
            Ok(self.0.saved.borrow().clone())
        }

        fn register_profile(&self, _profile: &ProfileSpec) -> WifiResult<()> {
            self.0.register_calls.set(self.0.register_calls.get() + 1);
            Ok(())
        }

        fn connect_network(&self, ssid: &str) -> WifiResult<()> {
            self.0.connect_calls.set(self.0.connect_calls.get() + 1);
            if self.0.connect_rejects.get() {
                return Err(WifiError::CommandFailed {
                    command: "mock".to_string(),
                    status: "exit status: 1".to_string(),
                    detail: "association rejected".to_string(),
                });
            }
            if self.0.connect_succeeds.get() {
                *self.0.current.borrow_mut() = Some(ssid.to_string());
            }
            Ok(())
        }

        fn disconnect_network(&self, _ssid: &str) -> WifiResult<()> {
            self.0.disconnect_calls.set(self.0.disconnect_calls.get() + 1);
            *self.0.current.borrow_mut() = None;
            Ok(())
        }
    }

    struct NoPrompt;

    impl CredentialPrompt for NoPrompt {
        fn request(&self, _ssid: &str) -> Option<SecretString> {
            panic!("prompt must not be consulted");
        }
    }

    struct CancelledPrompt;

    impl CredentialPrompt for CancelledPrompt {
        fn request(&self, _ssid: &str) -> Option<SecretString> {
            None
        }
    }

    struct FixedPrompt(&'static str);

    impl CredentialPrompt for FixedPrompt {
        fn request(&self, _ssid: &str) -> Option<SecretString> {
            Some(SecretString::from(self.0.to_string()))
        }
    }

    fn fast_options() -> ConnectOptions {
        ConnectOptions {
            timeout: Duration::from_millis(60),
            poll_interval: Duration::from_millis(20),
            registration_delay: Duration::from_millis(1),
        }
    }

    fn manager_with_mock() -> (WifiManager, Rc<MockState>) {
        let (backend, state) = MockBackend::new();
        (WifiManager::new(Box::new(backend)), state)
    }

    #[test]
    fn connect_is_idempotent_when_already_connected() {
        let (manager, mock) = manager_with_mock();
        *mock.current.borrow_mut() = Some("Home".to_string());
        let cancel = CancelToken::new();

        for _ in 0..2 {
            let outcome = manager
                .connect("Home", None, &NoPrompt, fast_options(), &cancel)
                .unwrap();
            assert_eq!(outcome, ConnectOutcome::Connected);
        }
        assert_eq!(mock.connect_calls.get(), 0);
    }

    #[test]
    fn saved_profile_connects_without_prompting() {
        let (manager, mock) = manager_with_mock();
        mock.saved.borrow_mut().push("Office".to_string());
        mock.connect_succeeds.set(true);
        let cancel = CancelToken::new();

        let outcome = manager
            .connect("Office", None, &NoPrompt, fast_options(), &cancel)
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Connected);
        assert_eq!(mock.connect_calls.get(), 1);
        assert_eq!(mock.register_calls.get(), 0);
    }

    #[test]
    fn unknown_network_with_declined_prompt_is_cancelled() {
        let (manager, mock) = manager_with_mock();
        let cancel = CancelToken::new();

        let outcome = manager
            .connect("Stranger", None, &CancelledPrompt, fast_options(), &cancel)
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Cancelled);
        assert_eq!(mock.connect_calls.get(), 0);
        assert_eq!(mock.register_calls.get(), 0);
    }

    #[test]
    fn prompted_credential_registers_a_profile() {
        let (manager, mock) = manager_with_mock();
        mock.connect_succeeds.set(true);
        let cancel = CancelToken::new();

        let outcome = manager
            .connect("Guest", None, &FixedPrompt("pass1234"), fast_options(), &cancel)
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Connected);
        assert_eq!(mock.register_calls.get(), 1);
        assert_eq!(mock.connect_calls.get(), 1);
    }

    #[test]
    fn explicit_credential_overrides_saved_profile() {
        let (manager, mock) = manager_with_mock();
        mock.saved.borrow_mut().push("Home".to_string());
        mock.connect_succeeds.set(true);
        let cancel = CancelToken::new();

        let outcome = manager
            .connect(
                "Home",
                Some(SecretString::from("newpass".to_string())),
                &NoPrompt,
                fast_options(),
                &cancel,
            )
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Connected);
        assert_eq!(mock.register_calls.get(), 1);
    }

    #[test]
    fn timeout_poll_count_is_bounded() {
        let (manager, mock) = manager_with_mock();
        mock.saved.borrow_mut().push("Slow".to_string());
        let cancel = CancelToken::new();
        let options = ConnectOptions {
            timeout: Duration::from_millis(60),
            poll_interval: Duration::from_millis(20),
            ..ConnectOptions::default()
        };

        let outcome = manager
            .connect("Slow", None, &NoPrompt, options, &cancel)
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::TimedOut);
        // One idempotence check plus at most timeout/interval polls.
        assert!(mock.current_calls.get() <= 4);
    }

    #[test]
    fn command_failure_surfaces_as_failed_outcome() {
        let (manager, mock) = manager_with_mock();
        mock.saved.borrow_mut().push("Broken".to_string());
        mock.connect_rejects.set(true);
        let cancel = CancelToken::new();

        let outcome = manager
            .connect("Broken", None, &NoPrompt, fast_options(), &cancel)
            .unwrap();

        match outcome {
            ConnectOutcome::Failed(reason) => assert!(reason.contains("association rejected")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn pre_cancelled_token_aborts_before_the_platform_connect() {
        let (manager, mock) = manager_with_mock();
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = manager
            .connect("Guest", None, &FixedPrompt("pw"), fast_options(), &cancel)
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Cancelled);
        assert_eq!(mock.connect_calls.get(), 0);
    }

    #[test]
    fn cancel_during_poll_ends_the_attempt() {
        let (manager, mock) = manager_with_mock();
        mock.saved.borrow_mut().push("Slow".to_string());
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            remote.cancel();
        });

        let options = ConnectOptions {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
            ..ConnectOptions::default()
        };
        let outcome = manager
            .connect("Slow", None, &NoPrompt, options, &cancel)
            .unwrap();
        handle.join().unwrap();

        assert_eq!(outcome, ConnectOutcome::Cancelled);
    }

    #[test]
    fn disconnect_is_a_no_op_for_other_networks() {
        let (manager, mock) = manager_with_mock();
        *mock.current.borrow_mut() = Some("Home".to_string());

        assert!(!manager.disconnect("Cafe").unwrap());
        assert_eq!(mock.disconnect_calls.get(), 0);
    }

    #[test]
    fn disconnect_issues_the_platform_command_when_connected() {
        let (manager, mock) = manager_with_mock();
        *mock.current.borrow_mut() = Some("Home".to_string());

        assert!(manager.disconnect("Home").unwrap());
        assert_eq!(mock.disconnect_calls.get(), 1);
        assert!(mock.current.borrow().is_none());
    }
}
