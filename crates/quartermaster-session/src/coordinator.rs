//! Session coordinator: an isolated Tokio task that owns the session.
//!
//! All session state lives inside one actor task. The outside world talks to
//! it through a cloneable [`SessionCoordinator`] handle that sends commands
//! over an mpsc channel. Timers talk to it the same way: when a timer fires,
//! its callback sends a command tagged with the epoch it was armed in, and
//! the actor drops the command if the session has moved on since.
//!
//! ```text
//!   SessionCoordinator ──┐
//!   SessionCoordinator ──┼── Command ──→ CoordinatorActor ──→ watch<SessionSnapshot>
//!   timer callbacks ─────┘   (mpsc)       │ owns              broadcast<SessionEvent>
//!                                         ├─ IdleTimeoutScheduler
//!                                         ├─ RefreshScheduler
//!                                         ├─ ExpiryWatchdog
//!                                         ├─ StatusPoller
//!                                         └─ ActivityMonitor
//! ```
//!
//! Timer callbacks hold only a *weak* sender. Once every handle is dropped
//! the channel closes, the actor stops, and its schedulers abort their
//! tasks on drop.

use std::sync::Arc;

use quartermaster_gateway::{
    AccountStatusGateway, AuthGateway, RefreshError, SessionStore,
};
use quartermaster_timer::{
    ActivityMonitor, ActivitySignal, Clock, ExpiryWatchdog,
    IdleTimeoutScheduler, RefreshScheduler, StatusPoller,
};
use quartermaster_token::{Claims, TokenCodec};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::{
    LogoutCause, SessionConfig, SessionError, SessionEvent, SessionSnapshot,
    TimerReport,
};

/// Capacity of the event channel. Slow subscribers lag rather than block
/// the actor.
const EVENT_CAPACITY: usize = 64;

/// Commands processed by the actor, one at a time.
enum Command {
    /// `login` / `admin_login` from a handle.
    Login {
        token: String,
        require_admin: bool,
        reply: oneshot::Sender<Result<Claims, SessionError>>,
    },

    /// Any logout, user-initiated or not.
    Logout {
        cause: LogoutCause,
        reply: oneshot::Sender<()>,
    },

    /// A raw activity signal, to be fed through the throttle.
    Signal(ActivitySignal),

    /// The throttle let one activity through.
    Activity,

    /// The idle countdown armed in `epoch` ran out.
    IdleElapsed { epoch: u64 },

    /// The token of `epoch` reached its `exp`.
    HardExpiry { epoch: u64 },

    /// The refresh armed in `epoch` came back.
    Refreshed {
        epoch: u64,
        result: Result<String, RefreshError>,
    },

    /// The status poller of `epoch` saw `active: false`.
    Deactivated { epoch: u64 },

    /// Report which timers are armed.
    Timers { reply: oneshot::Sender<TimerReport> },

    /// Stop the actor without logging out.
    Shutdown,
}

// ---------------------------------------------------------------------------
// SessionCoordinator (handle)
// ---------------------------------------------------------------------------

/// Handle to a running session coordinator.
///
/// Cheap to clone. Queries (`is_authenticated`, `current_user`, ...) read
/// the published snapshot directly and never wait on the actor. Mutations
/// are sent to the actor and awaited.
#[derive(Clone)]
pub struct SessionCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// Spawns the coordinator task and returns a handle to it.
    ///
    /// The task first restores any token left in `store` (see
    /// [`ready`](Self::ready)), then starts taking commands. `config` is
    /// passed through [`SessionConfig::validated`].
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn start<S, A, P, C>(
        config: SessionConfig,
        store: S,
        auth: Arc<A>,
        status: Arc<P>,
        clock: C,
    ) -> Self
    where
        S: SessionStore,
        A: AuthGateway,
        P: AccountStatusGateway,
        C: Clock,
    {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        let (commands, receiver) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(SessionSnapshot {
            loading: true,
            ..SessionSnapshot::default()
        });
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let actor = CoordinatorActor::new(
            config.validated(),
            store,
            auth,
            status,
            Arc::clone(&clock),
            receiver,
            commands.downgrade(),
            snapshot_tx,
            events.clone(),
        );
        tokio::spawn(actor.run());

        Self {
            commands,
            snapshot,
            events,
            clock,
        }
    }

    /// Starts a session with `token`.
    ///
    /// # Errors
    /// [`SessionError::InvalidToken`] if the token is malformed or expired.
    /// The current session, if any, is left as it was.
    pub async fn login(&self, token: &str) -> Result<Claims, SessionError> {
        self.request_login(token, false).await
    }

    /// Like [`login`](Self::login), but only for admin accounts.
    ///
    /// # Errors
    /// [`SessionError::InsufficientPrivilege`] for any other role. Nothing
    /// is persisted and the current session is left as it was.
    pub async fn admin_login(
        &self,
        token: &str,
    ) -> Result<Claims, SessionError> {
        self.request_login(token, true).await
    }

    /// Ends the session at the user's request.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.logout_with(LogoutCause::UserInitiated).await
    }

    /// Ends the session because the backend no longer accepts the token.
    pub async fn invalidate(&self) -> Result<(), SessionError> {
        self.logout_with(LogoutCause::ManualInvalidate).await
    }

    /// Ends the session, reporting `cause`.
    ///
    /// Idempotent. When this returns every session timer is cancelled and
    /// the persisted token is gone.
    pub async fn logout_with(
        &self,
        cause: LogoutCause,
    ) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Logout { cause, reply })?;
        rx.await.map_err(|_| SessionError::Unavailable)
    }

    /// Feeds one user-activity signal in. Ignored while logged out.
    pub fn record_activity(&self, signal: ActivitySignal) {
        let _ = self.send(Command::Signal(signal));
    }

    /// The logged-in user, if the token is still valid.
    pub fn current_user(&self) -> Option<Claims> {
        self.snapshot
            .borrow()
            .current_user(self.clock.now())
            .cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.borrow().is_authenticated(self.clock.now())
    }

    pub fn is_admin(&self) -> bool {
        self.snapshot.borrow().is_admin(self.clock.now())
    }

    /// Staff or plain user. Admins are not staff.
    pub fn is_staff(&self) -> bool {
        self.snapshot.borrow().is_staff(self.clock.now())
    }

    /// `true` until the stored token has been restored (or discarded).
    pub fn loading(&self) -> bool {
        self.snapshot.borrow().loading
    }

    /// Waits for startup hydration to finish.
    ///
    /// # Errors
    /// [`SessionError::Unavailable`] if the coordinator stopped first.
    pub async fn ready(&self) -> Result<(), SessionError> {
        let mut rx = self.snapshot.clone();
        rx.wait_for(|s| !s.loading)
            .await
            .map(|_| ())
            .map_err(|_| SessionError::Unavailable)
    }

    /// The current session generation.
    pub fn epoch(&self) -> u64 {
        self.snapshot.borrow().epoch
    }

    pub fn last_logout_cause(&self) -> Option<LogoutCause> {
        self.snapshot.borrow().last_logout
    }

    /// A copy of the last published state.
    ///
    /// After [`shutdown`](Self::shutdown) this is frozen at the last state
    /// the actor published.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every published change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribes to login/logout events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Reports which timers are armed and when they fire.
    pub async fn timers(&self) -> Result<TimerReport, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Timers { reply })?;
        rx.await.map_err(|_| SessionError::Unavailable)
    }

    /// Stops the coordinator task. The session is not logged out: the
    /// persisted token stays for the next start.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(Command::Shutdown)?;
        self.commands.closed().await;
        Ok(())
    }

    async fn request_login(
        &self,
        token: &str,
        require_admin: bool,
    ) -> Result<Claims, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Login {
            token: token.to_string(),
            require_admin,
            reply,
        })?;
        rx.await.map_err(|_| SessionError::Unavailable)?
    }

    fn send(&self, cmd: Command) -> Result<(), SessionError> {
        self.commands
            .send(cmd)
            .map_err(|_| SessionError::Unavailable)
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("snapshot", &*self.snapshot.borrow())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CoordinatorActor
// ---------------------------------------------------------------------------

/// Where a token being established came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Login,
    Refresh,
    /// Restored from the store at startup; already persisted.
    Hydrate,
}

/// Sends `cmd` to the actor if it is still running.
fn notify(loopback: &mpsc::WeakUnboundedSender<Command>, cmd: Command) {
    if let Some(tx) = loopback.upgrade() {
        let _ = tx.send(cmd);
    }
}

struct CoordinatorActor<S, A: AuthGateway, P: AccountStatusGateway> {
    store: S,
    clock: Arc<dyn Clock>,
    config: SessionConfig,

    claims: Option<Claims>,
    epoch: u64,
    loading: bool,
    last_logout: Option<LogoutCause>,
    /// When the latest raw activity signal arrived, before throttling.
    last_signal: Option<Instant>,

    idle: IdleTimeoutScheduler,
    refresh: RefreshScheduler<A>,
    expiry: ExpiryWatchdog,
    status: StatusPoller<P>,
    activity: ActivityMonitor,

    receiver: mpsc::UnboundedReceiver<Command>,
    loopback: mpsc::WeakUnboundedSender<Command>,
    snapshot: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl<S, A, P> CoordinatorActor<S, A, P>
where
    S: SessionStore,
    A: AuthGateway,
    P: AccountStatusGateway,
{
    #[allow(clippy::too_many_arguments)]
    fn new(
        config: SessionConfig,
        store: S,
        auth: Arc<A>,
        status: Arc<P>,
        clock: Arc<dyn Clock>,
        receiver: mpsc::UnboundedReceiver<Command>,
        loopback: mpsc::WeakUnboundedSender<Command>,
        snapshot: watch::Sender<SessionSnapshot>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            store,
            clock,
            claims: None,
            epoch: 0,
            loading: true,
            last_logout: None,
            last_signal: None,
            idle: IdleTimeoutScheduler::new(),
            refresh: RefreshScheduler::new(auth, config.refresh_buffer()),
            expiry: ExpiryWatchdog::new(),
            status: StatusPoller::new(
                status,
                config.status_initial_delay(),
                config.status_poll_interval(),
            ),
            activity: ActivityMonitor::new(config.activity_throttle()),
            config,
            receiver,
            loopback,
            snapshot,
            events,
        }
    }

    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        debug!("session coordinator started");
        self.hydrate();

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                Command::Login {
                    token,
                    require_admin,
                    reply,
                } => {
                    let result = self.handle_login(&token, require_admin);
                    let _ = reply.send(result);
                }
                Command::Logout { cause, reply } => {
                    self.end_session(cause);
                    let _ = reply.send(());
                }
                Command::Signal(signal) => self.handle_signal(signal),
                Command::Activity => self.handle_activity(),
                Command::IdleElapsed { epoch } => self.handle_idle_elapsed(epoch),
                Command::HardExpiry { epoch } => {
                    self.handle_timeout(epoch, LogoutCause::HardExpiry);
                }
                Command::Deactivated { epoch } => {
                    self.handle_timeout(epoch, LogoutCause::AccountDeactivated);
                }
                Command::Refreshed { epoch, result } => {
                    self.handle_refreshed(epoch, result);
                }
                Command::Timers { reply } => {
                    let _ = reply.send(self.timer_report());
                }
                Command::Shutdown => {
                    info!("session coordinator shutting down");
                    break;
                }
            }
        }

        self.cancel_timers();
        debug!("session coordinator stopped");
    }

    /// Restores the persisted token, if it is still good.
    fn hydrate(&mut self) {
        match self.store.get() {
            Ok(Some(token)) => {
                match TokenCodec::validate(&token, self.clock.now()) {
                    Ok(claims) => self.establish(&token, claims, Origin::Hydrate),
                    Err(e) => {
                        info!(error = %e, "discarding persisted token");
                        self.clear_store();
                    }
                }
            }
            Ok(None) => debug!("no persisted session"),
            Err(e) => warn!(error = %e, "failed to read persisted token"),
        }
        self.loading = false;
        self.publish();
    }

    fn handle_login(
        &mut self,
        token: &str,
        require_admin: bool,
    ) -> Result<Claims, SessionError> {
        let claims = TokenCodec::validate(token, self.clock.now())?;
        if require_admin && !claims.role.is_admin() {
            debug!(role = %claims.role, "admin login refused");
            return Err(SessionError::InsufficientPrivilege {
                role: claims.role,
            });
        }
        self.establish(token, claims.clone(), Origin::Login);
        Ok(claims)
    }

    /// Installs `claims` as the session and arms every timer for them.
    fn establish(&mut self, token: &str, claims: Claims, origin: Origin) {
        self.epoch += 1;
        let epoch = self.epoch;

        if origin != Origin::Hydrate {
            if let Err(e) = self.store.set(token) {
                warn!(error = %e, "failed to persist session token");
            }
        }
        if origin != Origin::Refresh {
            self.last_signal = None;
        }

        self.arm_timers(token, &claims, epoch);

        let refreshed = origin == Origin::Refresh;
        info!(
            subject = %claims.subject,
            role = %claims.role,
            expires_at = claims.expires_at,
            epoch,
            ?origin,
            "session established"
        );
        let subject = claims.subject.clone();
        self.claims = Some(claims);
        self.publish();
        let _ = self.events.send(SessionEvent::LoggedIn {
            subject,
            epoch,
            refreshed,
        });
    }

    /// (Re)arms all four schedulers against `claims`, tagging every
    /// callback with `epoch`. Each `arm` cancels its predecessor.
    fn arm_timers(&mut self, token: &str, claims: &Claims, epoch: u64) {
        let now = self.clock.now();

        let tx = self.loopback.clone();
        self.idle.arm(self.config.idle_timeout(), move || {
            notify(&tx, Command::IdleElapsed { epoch });
        });

        let tx = self.loopback.clone();
        self.refresh.arm(token, claims, now, move |result| {
            notify(&tx, Command::Refreshed { epoch, result });
        });

        let tx = self.loopback.clone();
        self.expiry.arm(claims, now, move || {
            notify(&tx, Command::HardExpiry { epoch });
        });

        let tx = self.loopback.clone();
        self.status.arm(token, move || {
            notify(&tx, Command::Deactivated { epoch });
        });

        // A refresh keeps the existing subscription and its window.
        if !self.activity.is_subscribed() {
            let tx = self.loopback.clone();
            self.activity.subscribe(move || notify(&tx, Command::Activity));
        }
    }

    fn cancel_timers(&mut self) {
        self.idle.cancel();
        self.refresh.cancel();
        self.expiry.cancel();
        self.status.cancel();
        self.activity.unsubscribe();
    }

    /// Tears the session down. Safe to call when already logged out.
    fn end_session(&mut self, cause: LogoutCause) {
        self.cancel_timers();
        self.clear_store();
        self.last_signal = None;

        let Some(claims) = self.claims.take() else {
            trace!(%cause, "logout while anonymous");
            return;
        };

        self.epoch += 1;
        self.last_logout = Some(cause);
        info!(subject = %claims.subject, %cause, epoch = self.epoch, "session ended");
        self.publish();
        let _ = self.events.send(SessionEvent::LoggedOut { cause });
    }

    /// Whether a continuation armed in `epoch` still belongs to the
    /// current session.
    fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch && self.claims.is_some()
    }

    fn handle_timeout(&mut self, epoch: u64, cause: LogoutCause) {
        if !self.is_current(epoch) {
            debug!(epoch, current = self.epoch, %cause, "stale timer ignored");
            return;
        }
        self.end_session(cause);
    }

    fn handle_signal(&mut self, signal: ActivitySignal) {
        if self.claims.is_none() {
            return;
        }
        self.last_signal = Some(Instant::now());
        self.activity.record(signal);
    }

    /// The throttle let a signal through: the idle countdown restarts
    /// from the latest signal, not from the end of the throttle window.
    fn handle_activity(&mut self) {
        if self.claims.is_none() {
            return;
        }
        let from = self.last_signal.unwrap_or_else(Instant::now);
        if self.idle.touch_from(from) {
            trace!("activity, idle countdown restarted");
        }
    }

    /// A signal still held in the throttle window counts as activity.
    fn handle_idle_elapsed(&mut self, epoch: u64) {
        if !self.is_current(epoch) {
            debug!(epoch, current = self.epoch, "stale idle timeout ignored");
            return;
        }
        let timeout = self.config.idle_timeout();
        let recent = self
            .last_signal
            .filter(|&at| at + timeout > Instant::now());
        if let Some(at) = recent {
            self.idle.touch_from(at);
            trace!("idle deadline reached with pending activity, countdown restarted");
            return;
        }
        self.end_session(LogoutCause::IdleTimeout);
    }

    fn handle_refreshed(
        &mut self,
        epoch: u64,
        result: Result<String, RefreshError>,
    ) {
        if !self.is_current(epoch) {
            debug!(epoch, current = self.epoch, "stale refresh response discarded");
            return;
        }
        match result {
            Ok(token) => match TokenCodec::validate(&token, self.clock.now()) {
                Ok(claims) => self.establish(&token, claims, Origin::Refresh),
                Err(e) => {
                    warn!(error = %e, "refreshed token rejected, session ends at expiry");
                }
            },
            Err(e) => {
                warn!(error = %e, "token refresh failed, session ends at expiry");
            }
        }
    }

    fn timer_report(&self) -> TimerReport {
        TimerReport {
            idle_deadline: self.idle.deadline(),
            refresh_at: self.refresh.refresh_at(),
            expires_at: self.expiry.expires_at(),
            status_polling: self.status.is_armed(),
            activity_subscribed: self.activity.is_subscribed(),
        }
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear persisted token");
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(SessionSnapshot {
            claims: self.claims.clone(),
            epoch: self.epoch,
            loading: self.loading,
            last_logout: self.last_logout,
        });
    }
}
