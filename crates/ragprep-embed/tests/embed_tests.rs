use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ragprep_core::error::Error;
use ragprep_core::traits::Sleeper;
use ragprep_embed::provider::fake::HashingTransport;
use ragprep_embed::{Backoff, BackoffPolicy, CallError, EmbedTransport, EmbeddingClient};

#[derive(Default)]
struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

impl RecordingSleeper {
    fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

/// Replays a fixed sequence of outcomes, then keeps throttling.
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Vec<f32>, CallError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<Vec<f32>, CallError>>) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script.into()), calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbedTransport for ScriptedTransport {
    fn embedder_id(&self) -> &str {
        "scripted"
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CallError::Throttled("still busy".into())))
    }
}

fn client(transport: &Arc<ScriptedTransport>, max: u32, sleeper: &Arc<RecordingSleeper>) -> EmbeddingClient {
    EmbeddingClient::new(Box::new(transport.clone()), BackoffPolicy::new(max), sleeper.clone())
}

#[test]
fn backoff_doubles_per_attempt_and_stops_on_the_last() {
    let policy = BackoffPolicy::new(4);
    assert_eq!(policy.next(1), Backoff::Wait(Duration::from_secs(2)));
    assert_eq!(policy.next(2), Backoff::Wait(Duration::from_secs(4)));
    assert_eq!(policy.next(3), Backoff::Wait(Duration::from_secs(8)));
    assert_eq!(policy.next(4), Backoff::Stop);
    assert_eq!(policy.worst_case(), Duration::from_secs(14));
}

#[test]
fn backoff_unit_is_configurable_and_attempts_floor_at_one() {
    let policy = BackoffPolicy::new(3).with_unit(Duration::from_millis(10));
    assert_eq!(policy.next(2), Backoff::Wait(Duration::from_millis(40)));

    let single = BackoffPolicy::new(0);
    assert_eq!(single.max_attempts(), 1);
    assert_eq!(single.next(1), Backoff::Stop);
    assert_eq!(single.worst_case(), Duration::ZERO);
}

#[test]
fn success_on_first_attempt_never_sleeps() {
    let transport = ScriptedTransport::new(vec![Ok(vec![1.0, 2.0])]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let v = client(&transport, 3, &sleeper).embed("hello").unwrap();
    assert_eq!(v, vec![1.0, 2.0]);
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.waits().is_empty());
}

#[test]
fn throttling_is_retried_with_backoff() {
    let transport = ScriptedTransport::new(vec![
        Err(CallError::Throttled("slow down".into())),
        Err(CallError::Unavailable("503".into())),
        Ok(vec![0.5]),
    ]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let v = client(&transport, 3, &sleeper).embed("hello").unwrap();
    assert_eq!(v, vec![0.5]);
    assert_eq!(transport.calls(), 3);
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(2), Duration::from_secs(4)]);
}

#[test]
fn persistent_throttling_exhausts_retries_without_a_final_sleep() {
    let transport = ScriptedTransport::new(Vec::new());
    let sleeper = Arc::new(RecordingSleeper::default());
    let err = client(&transport, 3, &sleeper).embed("hello").unwrap_err();
    assert!(matches!(err, Error::ExhaustedRetries { attempts: 3 }));
    assert_eq!(transport.calls(), 3);
    assert_eq!(sleeper.waits().len(), 2);
}

#[test]
fn fatal_errors_fail_fast() {
    let transport = ScriptedTransport::new(vec![Err(CallError::Fatal("400 ValidationException".into()))]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let err = client(&transport, 5, &sleeper).embed("hello").unwrap_err();
    assert!(matches!(err, Error::Provider(ref m) if m.contains("ValidationException")));
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.waits().is_empty());
}

#[test]
fn dimension_check_is_opt_in() {
    let sleeper = Arc::new(RecordingSleeper::default());

    let transport = ScriptedTransport::new(vec![Ok(vec![0.0; 3])]);
    assert!(client(&transport, 1, &sleeper).embed("x").is_ok());

    let transport = ScriptedTransport::new(vec![Ok(vec![0.0; 3])]);
    let err = client(&transport, 1, &sleeper)
        .with_expected_dimension(Some(4))
        .embed("x")
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 3 }));
}

#[test]
fn hashing_transport_is_deterministic_and_normalized() {
    let t = HashingTransport::new(64);
    let a = t.embed("hello world").unwrap();
    let b = t.embed("hello world").unwrap();
    assert_eq!(a.len(), 64);
    assert_eq!(a, b);
    let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "norm={norm}");
    assert_ne!(a, t.embed("something else entirely").unwrap());
}
