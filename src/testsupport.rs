//! Shared test fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use parking_lot::{Mutex, MutexGuard};
use crate::bindings::*;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

static DEFAULT_CONTEXT: Mutex<()> = Mutex::new(());

///Serializes tests that iterate (or add sources to) the process-wide default context.
pub(crate) fn default_context_lock() -> MutexGuard<'static, ()> {
    init_logging();
    DEFAULT_CONTEXT.lock()
}

///A process-unique name for types and signals.  Registrations are global and permanent.
pub(crate) fn unique_name(prefix: &str) -> String {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    format!("{}{}", prefix, NEXT.fetch_add(1, Ordering::Relaxed))
}

///An object type with an int property `count` (default 7) and a signal `bumped(i32)`.
pub(crate) fn counter_type() -> Type {
    static COUNTER: OnceLock<Type> = OnceLock::new();
    *COUNTER.get_or_init(|| {
        TypeBuilder::new("GobrTestCounter")
            .property(PropertySpec::int("count", i32::MIN, i32::MAX, 7))
            .signal(SignalSpec::new("bumped").param(Type::INT))
            .register()
            .unwrap()
    })
}

///Iterates `ctx` until `done` returns true.  Gives up after a few seconds.
pub(crate) fn iterate_until(ctx: &MainContext, done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        if Instant::now() > deadline {
            return false;
        }
        if !ctx.iteration(false) {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
    true
}

#[cfg(feature = "gtk")]
type GtkJob = Box<dyn FnOnce() + Send>;

///Runs `f` on the one thread that initialized GTK, while holding [default_context_lock].  Panics in `f` are
///resumed on the calling thread.  Without a display `f` is skipped.
#[cfg(feature = "gtk")]
pub(crate) fn with_gtk(f: impl FnOnce() + Send + 'static) {
    use std::sync::mpsc::{channel, sync_channel, Sender, SyncSender};
    static GTK_THREAD: OnceLock<Mutex<Sender<(GtkJob, SyncSender<std::thread::Result<()>>)>>> = OnceLock::new();
    static HAS_DISPLAY: OnceLock<bool> = OnceLock::new();

    let _lock = default_context_lock();
    let jobs = GTK_THREAD.get_or_init(|| {
        let (send, receive) = channel::<(GtkJob, SyncSender<std::thread::Result<()>>)>();
        std::thread::Builder::new()
            .name("gtk".to_owned())
            .spawn(move || {
                let ok = crate::gtk::init().is_ok();
                let _ = HAS_DISPLAY.set(ok);
                for (job, done) in receive {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
                    let _ = done.send(result);
                }
            })
            .unwrap();
        Mutex::new(send)
    });
    let (done, result) = sync_channel(1);
    let job: GtkJob = Box::new(move || {
        if HAS_DISPLAY.get().copied().unwrap_or(false) {
            f()
        } else {
            eprintln!("no display, skipping");
        }
    });
    jobs.lock().send((job, done)).unwrap();
    if let Err(payload) = result.recv().unwrap() {
        std::panic::resume_unwind(payload);
    }
}
