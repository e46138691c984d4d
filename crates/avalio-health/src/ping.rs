//! Ping resource — echo probes serialized through a process-wide lock.
//!
//! The probe mechanism is behind the [`Prober`] trait. [`SystemPing`] runs
//! the platform `ping` binary; concurrent use is not safe, so every
//! [`PingResource`] in the process shares one [`ProbeLock`].

use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use avalio_core::CheckDetail;
use avalio_core::config::PingResourceConfig;

use crate::error::{ProbeError, ResourceResult};
use crate::resource::{CheckOutcome, Resource};

/// Attempts per check.
pub const PING_ATTEMPTS: u32 = 3;
/// Pause between failed attempts.
pub const PING_RETRY_DELAY: Duration = Duration::from_secs(1);

static RTT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=([0-9.]+)\s*ms").expect("valid rtt pattern"));

/// Mutual exclusion for the shared probe mechanism.
///
/// Cloning shares the same lock.
#[derive(Clone, Default)]
pub struct ProbeLock(Arc<Mutex<()>>);

impl ProbeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Sends one echo request and waits for the reply.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Returns the round-trip time, or why no reply arrived in time.
    async fn probe(&self, address: &str, timeout: Duration) -> Result<Duration, ProbeError>;
}

/// Probes by running the system `ping` binary once per attempt.
pub struct SystemPing {
    program: String,
}

impl SystemPing {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for SystemPing {
    async fn probe(&self, address: &str, timeout: Duration) -> Result<Duration, ProbeError> {
        let args = ping_args(address, timeout);
        debug!(cmd = %self.program, ?args, "exec ping");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(output) => output?,
            Err(_) => return Err(ProbeError::Timeout(timeout)),
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let text = text.trim();

        if !output.status.success() {
            return Err(ProbeError::Failed(format!("{}: {text}", output.status)));
        }
        Ok(parse_rtt(text).unwrap_or_default())
    }
}

/// `ping -c 1 -n -W wait address`; macOS takes the wait in milliseconds.
fn ping_args(address: &str, timeout: Duration) -> Vec<String> {
    let wait = if cfg!(target_os = "macos") {
        timeout.as_millis().max(1) as u64
    } else {
        (timeout.as_secs_f64().ceil() as u64).max(1)
    };
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-n".to_string(),
        "-W".to_string(),
        wait.to_string(),
        address.to_string(),
    ]
}

fn parse_rtt(output: &str) -> Option<Duration> {
    let caps = RTT_PATTERN.captures(output)?;
    let ms: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_micros((ms * 1000.0).round() as u64))
}

pub struct PingResource {
    name: String,
    address: String,
    timeout: Duration,
    prober: Arc<dyn Prober>,
    lock: ProbeLock,
}

impl PingResource {
    pub fn new(
        name: &str,
        address: &str,
        timeout: Duration,
        prober: Arc<dyn Prober>,
        lock: ProbeLock,
    ) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            timeout,
            prober,
            lock,
        }
    }

    pub fn from_config(
        config: &PingResourceConfig,
        prober: Arc<dyn Prober>,
        lock: ProbeLock,
    ) -> ResourceResult<Self> {
        Ok(Self::new(
            &config.name,
            &config.address,
            config.timeout()?,
            prober,
            lock,
        ))
    }

    async fn attempt(&self) -> Result<Duration, ProbeError> {
        let _guard = self.lock.acquire().await;
        self.prober.probe(&self.address, self.timeout).await
    }
}

#[async_trait]
impl Resource for PingResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "ping"
    }

    async fn check(&self) -> CheckOutcome {
        let mut attempt = 1;
        loop {
            match self.attempt().await {
                Ok(rtt) => {
                    debug!(resource = %self.name, rtt_ms = rtt.as_millis() as u64, "ping reply");
                    return CheckOutcome::ok();
                }
                Err(e) if attempt >= PING_ATTEMPTS => {
                    return CheckOutcome::failed(vec![
                        CheckDetail::new("reason", "address is unreachable"),
                        CheckDetail::new("address", &self.address),
                        CheckDetail::new("error", e.to_string()),
                    ]);
                }
                Err(e) => {
                    debug!(resource = %self.name, attempt, error = %e, "ping failed, retrying");
                }
            }
            attempt += 1;
            tokio::time::sleep(PING_RETRY_DELAY).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted replies and records concurrent use.
    #[derive(Default)]
    struct FakeProber {
        replies: std::sync::Mutex<VecDeque<bool>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeProber {
        fn scripted(replies: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                replies: std::sync::Mutex::new(replies.iter().copied().collect()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, _address: &str, timeout: Duration) -> Result<Duration, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let reply = self.replies.lock().unwrap().pop_front().unwrap_or(false);
            if reply {
                Ok(Duration::from_millis(3))
            } else {
                Err(ProbeError::Timeout(timeout))
            }
        }
    }

    fn resource(name: &str, prober: Arc<FakeProber>, lock: ProbeLock) -> PingResource {
        PingResource::new(name, "10.0.0.1", Duration::from_secs(1), prober, lock)
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_reply() {
        let prober = FakeProber::scripted(&[true]);
        let outcome = resource("gw", prober.clone(), ProbeLock::new()).check().await;
        assert_eq!(outcome, CheckOutcome::ok());
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_reply() {
        let prober = FakeProber::scripted(&[false, true]);
        let outcome = resource("gw", prober.clone(), ProbeLock::new()).check().await;
        assert!(outcome.ok);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fails_after_three_attempts() {
        let prober = FakeProber::scripted(&[]);
        let start = tokio::time::Instant::now();
        let outcome = resource("gw", prober.clone(), ProbeLock::new()).check().await;

        assert!(!outcome.ok);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.details.len(), 3);
        assert_eq!(outcome.details[1], CheckDetail::new("address", "10.0.0.1"));
        // Two pauses between three attempts.
        assert!(start.elapsed() >= PING_RETRY_DELAY * 2);
        assert!(start.elapsed() < PING_RETRY_DELAY * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_lock_serializes_probes() {
        let prober = FakeProber::scripted(&[true, true, true]);
        let lock = ProbeLock::new();
        let a = resource("a", prober.clone(), lock.clone());
        let b = resource("b", prober.clone(), lock.clone());
        let c = resource("c", prober.clone(), lock);

        let (ra, rb, rc) = tokio::join!(a.check(), b.check(), c.check());
        assert!(ra.ok && rb.ok && rc.ok);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_locks_do_not_serialize() {
        let prober = FakeProber::scripted(&[true, true]);
        let a = resource("a", prober.clone(), ProbeLock::new());
        let b = resource("b", prober.clone(), ProbeLock::new());

        tokio::join!(a.check(), b.check());
        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn args_include_wait_and_address() {
        let args = ping_args("example.com", Duration::from_millis(1500));
        assert_eq!(&args[..3], &["-c", "1", "-n"]);
        assert_eq!(args[3], "-W");
        if cfg!(target_os = "macos") {
            assert_eq!(args[4], "1500");
        } else {
            assert_eq!(args[4], "2");
        }
        assert_eq!(args.last().unwrap(), "example.com");
    }

    #[test]
    fn sub_second_wait_rounds_up() {
        let args = ping_args("10.0.0.1", Duration::from_millis(200));
        if cfg!(target_os = "macos") {
            assert_eq!(args, vec!["-c", "1", "-n", "-W", "200", "10.0.0.1"]);
        } else {
            assert_eq!(args, vec!["-c", "1", "-n", "-W", "1", "10.0.0.1"]);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_ping_binary_is_killed_at_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ping");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let prober = SystemPing::with_program(script.to_string_lossy());
        let start = std::time::Instant::now();
        let err = prober
            .probe("10.255.255.1", Duration::from_millis(300))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn parses_round_trip_time() {
        let out = "64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.045 ms";
        assert_eq!(parse_rtt(out), Some(Duration::from_micros(45)));
        assert_eq!(parse_rtt("no reply"), None);
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let prober = SystemPing::with_program("/nonexistent/avalio-ping");
        let err = prober
            .probe("127.0.0.1", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Spawn(_)));
    }
}
