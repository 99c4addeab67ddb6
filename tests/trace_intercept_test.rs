//! Integration tests for the trace engine and the interception layer.

use calltrace::intercept::{
    Advisor, CallResult, ErasedResult, Interceptor, InterceptError, Invocation, MethodRef,
    NameFilter, ProxyChain, RetryInterceptor, TraceInterceptor,
};
use calltrace::trace::{MemorySink, SharedContext, Tracer};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("calltrace=debug")
        .with_test_writer()
        .try_init();
}

fn memory_tracer() -> (Tracer, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let tracer = Tracer::builder().sink(sink.clone()).build();
    (tracer, sink)
}

#[test]
fn nesting_invariant_over_deep_stack() {
    init_logging();
    let (tracer, sink) = memory_tracer();

    const DEPTH: u32 = 5;
    let mut records = Vec::new();
    for i in 0..DEPTH {
        records.push(tracer.begin(format!("level{i}")));
    }
    while let Some(record) = records.pop() {
        tracer.end(record);
    }

    let levels: Vec<u32> = sink.events().iter().map(|e| e.level).collect();
    assert_eq!(levels, vec![0, 1, 2, 3, 4, 4, 3, 2, 1, 0]);

    // One token for the whole request, and the slot is empty at rest.
    let events = sink.events();
    assert!(events.iter().all(|e| e.id == events[0].id));
    assert!(tracer.current().is_none());
}

#[test]
fn rendered_lines_show_nesting() {
    let (tracer, sink) = memory_tracer();

    let outer = tracer.begin("OrderService.process()");
    let inner = tracer.begin("OrderRepository.save()");
    tracer.end(inner);
    tracer.end(outer);

    let lines = sink.lines();
    let id = sink.events()[0].id.clone();
    assert_eq!(lines[0], format!("[{id}] OrderService.process()"));
    assert!(lines[1].starts_with(&format!("[{id}] |-->OrderRepository.save()")));
    assert!(lines[2].starts_with(&format!("[{id}] |<--OrderRepository.save() time=")));
    assert!(lines[3].starts_with(&format!("[{id}] OrderService.process() time=")));
}

#[test]
fn cross_thread_handoff_is_explicit() {
    let (tracer, sink) = memory_tracer();

    let outer = tracer.begin("outer");
    let handoff = outer.correlation();
    assert_eq!(handoff.level(), 0);

    let worker_tracer = tracer.clone();
    let worker = thread::spawn(move || {
        let record = worker_tracer.begin_with_id(handoff, "inner");
        let level = record.correlation().level();
        let token = record.correlation().to_string();
        worker_tracer.end(record);
        (level, token, worker_tracer.current().is_none())
    });
    let (level, token, slot_empty) = worker.join().unwrap();

    // The worker renders one level below the outer span, under the same id.
    assert_eq!(level, 1);
    assert_eq!(token, handoff.to_string());
    assert!(slot_empty);

    // This thread's context was unaffected throughout.
    assert_eq!(tracer.current(), Some(handoff));
    tracer.end(outer);
    assert!(tracer.current().is_none());
    assert_eq!(sink.count(), 4);
}

#[test]
fn spawned_thread_does_not_inherit_context() {
    let (tracer, _sink) = memory_tracer();
    let outer = tracer.begin("outer");

    let inner_tracer = tracer.clone();
    let seen = thread::spawn(move || inner_tracer.current()).join().unwrap();
    assert!(seen.is_none());

    tracer.end(outer);
}

#[test]
fn shared_context_cross_contaminates_levels() {
    // Deterministic interleaving: thread two begins only after thread one's
    // begin has landed in the shared slot.
    let sink = Arc::new(MemorySink::new());
    let tracer = Tracer::builder()
        .context(Arc::new(SharedContext::new()))
        .sink(sink.clone())
        .build();

    let (ready_tx, ready_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();

    let tracer_one = tracer.clone();
    let one = thread::spawn(move || {
        let record = tracer_one.begin("one");
        ready_tx.send(()).unwrap();
        done_rx.recv().unwrap();
        tracer_one.end(record);
    });

    ready_rx.recv().unwrap();
    // This is thread two's outermost call, yet the shared slot reports the
    // depth of thread one's in-flight span.
    let record = tracer.begin("two");
    assert_eq!(record.correlation().level(), 1);
    tracer.end(record);
    done_tx.send(()).unwrap();
    one.join().unwrap();

    let begin_levels: Vec<u32> = sink
        .events()
        .iter()
        .filter(|e| e.elapsed_ms.is_none())
        .map(|e| e.level)
        .collect();
    assert_eq!(begin_levels, vec![0, 1]);
}

#[test]
fn thread_local_context_keeps_threads_apart() {
    // Same interleaving as the shared-context test; the per-thread default
    // gives each thread its own root.
    let (tracer, sink) = memory_tracer();

    let (ready_tx, ready_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();

    let tracer_one = tracer.clone();
    let one = thread::spawn(move || {
        let record = tracer_one.begin("one");
        ready_tx.send(()).unwrap();
        done_rx.recv().unwrap();
        tracer_one.end(record);
    });

    ready_rx.recv().unwrap();
    let record = tracer.begin("two");
    assert_eq!(record.correlation().level(), 0);
    tracer.end(record);
    done_tx.send(()).unwrap();
    one.join().unwrap();

    let begin_events: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| e.elapsed_ms.is_none())
        .collect();
    assert_eq!(begin_events.len(), 2);
    assert!(begin_events.iter().all(|e| e.level == 0));
    assert_ne!(begin_events[0].id, begin_events[1].id);
}

/// A repository that fails a fixed number of times before succeeding.
struct FlakyRepository {
    failures_left: AtomicU32,
}

impl FlakyRepository {
    fn new(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
        }
    }

    fn save(&self, item: &str) -> CallResult<String> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err("database unavailable".into());
        }
        Ok(format!("saved {item}"))
    }

    fn ping(&self) -> CallResult<()> {
        Ok(())
    }
}

#[test]
fn traced_retry_chain_end_to_end() {
    init_logging();
    let (tracer, sink) = memory_tracer();

    let chain = ProxyChain::builder(FlakyRepository::new(2))
        .advisor(Advisor::new(
            NameFilter::new(["save*", "request*"]),
            Arc::new(TraceInterceptor::new(tracer.clone())),
        ))
        .advisor(Advisor::always(Arc::new(RetryInterceptor::new(4).unwrap())))
        .build();

    let saved = chain
        .invoke(MethodRef::new("FlakyRepository", "save"), |t| t.save("order"))
        .unwrap();
    assert_eq!(saved, "saved order");

    // One span around the whole retried call, ended successfully.
    let lines = sink.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("] FlakyRepository.save()"));
    assert!(lines[1].contains("FlakyRepository.save() time="));
    assert!(!lines[1].contains("<X-"));

    // A method the filter does not match bypasses the tracer entirely.
    sink.clear();
    chain
        .invoke(MethodRef::new("FlakyRepository", "ping"), |t| t.ping())
        .unwrap();
    assert_eq!(sink.count(), 0);
}

#[test]
fn retry_exhaustion_fails_the_span() {
    let (tracer, sink) = memory_tracer();

    let chain = ProxyChain::builder(FlakyRepository::new(u32::MAX))
        .advisor(Advisor::always(Arc::new(TraceInterceptor::new(
            tracer.clone(),
        ))))
        .advisor(Advisor::always(Arc::new(RetryInterceptor::new(3).unwrap())))
        .build();

    let outer = tracer.begin("OrderService.order()");
    let err = chain
        .invoke(MethodRef::new("FlakyRepository", "save"), |t| t.save("order"))
        .unwrap_err();
    tracer.end(outer);

    let err = err.downcast_ref::<InterceptError>().unwrap();
    assert!(matches!(
        err,
        InterceptError::RetryExhausted { attempts: 3, .. }
    ));

    // The traced span sits one level under the outer span, so its failure
    // line carries the exception glyph.
    let lines = sink.lines();
    assert!(lines[2].contains("|<X-FlakyRepository.save()"));
    assert!(lines[2].contains("ex=retry exhausted after 3 attempts"));
    assert!(tracer.current().is_none());
}

#[test]
fn nested_service_and_repository_spans() {
    let (tracer, sink) = memory_tracer();

    let repository = ProxyChain::builder(FlakyRepository::new(0))
        .advisor(Advisor::always(Arc::new(TraceInterceptor::new(
            tracer.clone(),
        ))))
        .build();

    let service = ProxyChain::builder(repository)
        .advisor(Advisor::always(Arc::new(TraceInterceptor::new(
            tracer.clone(),
        ))))
        .build();

    service
        .invoke(MethodRef::new("OrderService", "orderItem"), |repo| {
            repo.invoke(MethodRef::new("OrderRepository", "save"), |t| {
                t.save("itemA")
            })
        })
        .unwrap();

    let events = sink.events();
    assert_eq!(
        events.iter().map(|e| e.level).collect::<Vec<_>>(),
        vec![0, 1, 1, 0]
    );
    assert_eq!(events[0].label, "OrderService.orderItem()");
    assert_eq!(events[1].label, "OrderRepository.save()");
    assert!(tracer.current().is_none());
}

/// Records enter/exit markers so ordering can be asserted.
struct MarkerInterceptor {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Interceptor for MarkerInterceptor {
    fn intercept(&self, invocation: &mut dyn Invocation) -> ErasedResult {
        self.log.lock().unwrap().push(format!("{}-enter", self.name));
        let result = invocation.proceed();
        self.log.lock().unwrap().push(format!("{}-exit", self.name));
        result
    }
}

struct PlainService;

impl PlainService {
    fn run(&self) -> CallResult<()> {
        Ok(())
    }
}

#[test]
fn flat_chain_and_nested_chains_are_equivalent() {
    let method = MethodRef::new("PlainService", "run");

    // One chain, two advisors.
    let flat_log = Arc::new(Mutex::new(Vec::new()));
    let flat = ProxyChain::builder(PlainService)
        .advisor(Advisor::always(Arc::new(MarkerInterceptor {
            name: "A",
            log: flat_log.clone(),
        })))
        .advisor(Advisor::always(Arc::new(MarkerInterceptor {
            name: "B",
            log: flat_log.clone(),
        })))
        .build();
    flat.invoke(method, |t| t.run()).unwrap();

    // Two physically nested chains: the outer chain's target is the inner
    // chain, registered with the same advisors outermost-first.
    let nested_log = Arc::new(Mutex::new(Vec::new()));
    let inner = ProxyChain::builder(PlainService)
        .advisor(Advisor::always(Arc::new(MarkerInterceptor {
            name: "B",
            log: nested_log.clone(),
        })))
        .build();
    let outer = ProxyChain::builder(inner)
        .advisor(Advisor::always(Arc::new(MarkerInterceptor {
            name: "A",
            log: nested_log.clone(),
        })))
        .build();
    outer
        .invoke(method, |inner| inner.invoke(method, |t| t.run()))
        .unwrap();

    let expected = vec!["A-enter", "B-enter", "B-exit", "A-exit"];
    assert_eq!(*flat_log.lock().unwrap(), expected);
    assert_eq!(*nested_log.lock().unwrap(), expected);
}

#[test]
fn concurrent_invocations_share_one_chain() {
    let (tracer, sink) = memory_tracer();

    let chain = Arc::new(
        ProxyChain::builder(FlakyRepository::new(0))
            .advisor(Advisor::always(Arc::new(TraceInterceptor::new(
                tracer.clone(),
            ))))
            .build(),
    );

    let mut handles = Vec::new();
    for i in 0..4 {
        let chain = chain.clone();
        handles.push(thread::spawn(move || {
            chain
                .invoke(MethodRef::new("FlakyRepository", "save"), |t| {
                    t.save(&format!("item{i}"))
                })
                .unwrap()
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Every thread traced an independent root span.
    let events = sink.events();
    assert_eq!(events.len(), 8);
    assert!(events.iter().all(|e| e.level == 0));
}
