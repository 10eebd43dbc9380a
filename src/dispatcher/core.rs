use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use may::sync::mpsc;
use tracing::{debug, error, warn};

use crate::context::{RequestContext, ResponseContext};
use crate::middleware::ChainHandler;
use crate::runtime_config::RuntimeConfig;

/// Application-level error raised by a handler through its continuation.
///
/// Cheaply cloneable so the same error can flow through every error-capable
/// handler in the chain and still be carried out in the final outcome.
#[derive(Clone)]
pub struct HandlerError(Arc<anyhow::Error>);

impl HandlerError {
    #[must_use]
    pub fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }

    /// Build an error from a display-able message.
    #[must_use]
    pub fn msg<M: fmt::Display>(message: M) -> Self {
        Self(Arc::new(anyhow::anyhow!("{message}")))
    }

    /// The underlying error value.
    #[must_use]
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::msg(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::msg(message)
    }
}

enum ControlSignal {
    Proceed,
    Fail(HandlerError),
}

/// The callable a handler invokes to pass control onward.
///
/// One-shot per invocation: the first `proceed`/`fail` wins, extra calls are
/// logged and ignored. Clone it into a spawned coroutine to resolve the
/// chain after the handler function has returned.
#[derive(Clone)]
pub struct Continuation {
    signal_tx: mpsc::Sender<ControlSignal>,
    used: Arc<AtomicBool>,
}

impl Continuation {
    fn new() -> (Self, mpsc::Receiver<ControlSignal>) {
        let (signal_tx, signal_rx) = mpsc::channel();
        (
            Self {
                signal_tx,
                used: Arc::new(AtomicBool::new(false)),
            },
            signal_rx,
        )
    }

    /// Advance to the next handler in the chain.
    pub fn proceed(&self) {
        if self.used.swap(true, Ordering::AcqRel) {
            warn!("continuation invoked more than once; extra call ignored");
            return;
        }
        let _ = self.signal_tx.send(ControlSignal::Proceed);
    }

    /// Short-circuit the ordinary chain and transfer to error handling.
    pub fn fail<E: Into<HandlerError>>(&self, err: E) {
        if self.used.swap(true, Ordering::AcqRel) {
            warn!("continuation invoked more than once; extra call ignored");
            return;
        }
        let _ = self.signal_tx.send(ControlSignal::Fail(err.into()));
    }
}

/// Cooperative cancellation signal for an abandoned connection.
///
/// The transport fires it; the executor stops advancing the chain at the
/// next opportunity without interrupting an in-flight handler.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Terminal state of one chain execution.
#[derive(Debug)]
pub enum Outcome {
    /// A handler sent a response.
    Completed,
    /// The ordinary chain ran out without anyone sending; the caller may
    /// fall through to its not-found behavior.
    Unhandled,
    /// An error reached the end of the error chain unrecovered.
    Failed(HandlerError),
    /// A handler neither sent nor continued within the configured timeout.
    TimedOut,
    /// The connection was abandoned mid-chain.
    Cancelled,
}

impl Outcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    /// Short tag for log fields and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Unhandled => "unhandled",
            Outcome::Failed(_) => "failed",
            Outcome::TimedOut => "timed_out",
            Outcome::Cancelled => "cancelled",
        }
    }
}

/// Executes handler chains in order under continuation control.
///
/// Stateless between executions; per-request state lives on the stack of the
/// dispatching task, so one executor serves concurrent dispatches.
#[derive(Debug, Clone)]
pub struct ChainExecutor {
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl Default for ChainExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }

    #[must_use]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            timeout: config.dispatch_timeout,
            poll_interval: config.poll_interval,
        }
    }

    /// Replace the per-handler wait bound.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a chain to its terminal outcome.
    ///
    /// Handlers execute strictly in order on the calling task. Between
    /// invocations the executor observes, in priority order: the response
    /// sent-flag, the continuation signal, the request's cancel token, and
    /// the optional deadline.
    #[must_use]
    pub fn execute(
        &self,
        chain: &[ChainHandler],
        req: &Arc<RequestContext>,
        res: &Arc<ResponseContext>,
    ) -> Outcome {
        let cancel = req.cancel_token();
        let mut cursor = 0usize;
        let mut pending_err: Option<HandlerError> = None;

        debug!(
            request_id = %req.request_id,
            chain_len = chain.len(),
            timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
            "chain execution start"
        );

        loop {
            if cancel.is_cancelled() {
                debug!(request_id = %req.request_id, "dispatch cancelled before next handler");
                return Outcome::Cancelled;
            }

            let Some(pos) = next_position(chain, cursor, pending_err.is_some()) else {
                return match pending_err {
                    Some(err) => {
                        error!(
                            request_id = %req.request_id,
                            error = %err,
                            "error chain exhausted without recovery"
                        );
                        Outcome::Failed(err)
                    }
                    None => Outcome::Unhandled,
                };
            };

            let (next, signal_rx) = Continuation::new();
            let handler = chain[pos].clone();
            debug!(
                request_id = %req.request_id,
                position = pos,
                kind = handler.kind(),
                "invoking chain handler"
            );

            let run = catch_unwind(AssertUnwindSafe(|| match &handler {
                ChainHandler::Ordinary(h) => {
                    h.handle(Arc::clone(req), Arc::clone(res), next.clone());
                }
                ChainHandler::Error(h) => {
                    // next_position only selects error handlers in error mode
                    if let Some(err) = pending_err.clone() {
                        h.handle(err, Arc::clone(req), Arc::clone(res), next.clone());
                    }
                }
            }));
            drop(next);

            if let Err(panic) = run {
                let message = panic_message(panic);
                error!(
                    request_id = %req.request_id,
                    position = pos,
                    panic_message = %message,
                    "handler panicked"
                );
                pending_err = Some(HandlerError::msg(format!("handler panicked: {message}")));
                cursor = pos + 1;
                continue;
            }

            let deadline = self.timeout.map(|t| Instant::now() + t);
            let signal = loop {
                // sent-flag first: sending and continuing are alternative
                // signals, and a response ends the chain outright
                if res.is_sent() {
                    debug!(
                        request_id = %req.request_id,
                        position = pos,
                        "response sent; chain complete"
                    );
                    return Outcome::Completed;
                }
                match signal_rx.try_recv() {
                    Ok(signal) => break signal,
                    Err(_) => {
                        if cancel.is_cancelled() {
                            debug!(
                                request_id = %req.request_id,
                                position = pos,
                                "dispatch cancelled while waiting on handler"
                            );
                            return Outcome::Cancelled;
                        }
                        if let Some(deadline) = deadline {
                            if Instant::now() >= deadline {
                                warn!(
                                    request_id = %req.request_id,
                                    position = pos,
                                    timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
                                    "handler neither sent a response nor continued within the dispatch timeout"
                                );
                                return Outcome::TimedOut;
                            }
                        }
                        yield_wait(self.poll_interval);
                    }
                }
            };

            match signal {
                ControlSignal::Proceed => {
                    cursor = pos + 1;
                }
                ControlSignal::Fail(err) => {
                    debug!(
                        request_id = %req.request_id,
                        position = pos,
                        error = %err,
                        "handler reported an error; transferring to error chain"
                    );
                    pending_err = Some(err);
                    cursor = pos + 1;
                }
            }
        }
    }
}

/// Next runnable handler at or after `cursor`: ordinary handlers in ordinary
/// mode, error-capable handlers once an error is pending.
fn next_position(chain: &[ChainHandler], cursor: usize, error_mode: bool) -> Option<usize> {
    chain
        .iter()
        .enumerate()
        .skip(cursor)
        .find(|(_, h)| h.is_error() == error_mode)
        .map(|(i, _)| i)
}

fn yield_wait(interval: Duration) {
    if may::coroutine::is_coroutine() {
        may::coroutine::sleep(interval);
    } else {
        std::thread::sleep(interval);
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
