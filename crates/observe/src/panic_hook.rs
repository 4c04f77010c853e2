use std::panic::PanicHookInfo;

/// Replaces the default panic hook with [`tracing_panic_hook`].
pub fn install() {
    std::panic::set_hook(Box::new(tracing_panic_hook));
}

/// Panic hook that prints roughly the same message as the default panic hook
/// but uses tracing:error instead of stderr.
///
/// Keeps panics in the same format as every other log line, which matters
/// when the output is JSON.
fn tracing_panic_hook(panic: &PanicHookInfo) {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("<unnamed>");
    let backtrace = std::backtrace::Backtrace::capture();
    tracing::error!("thread '{name}' {panic}\nstack backtrace:\n{backtrace}");
}
