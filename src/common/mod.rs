pub mod io;

use tracing_subscriber::EnvFilter;

/// Name printed in front of program-level error messages.
pub const TOOL_NAME: &str = "crc32par";

/// Environment variable holding the diagnostics filter (falls back to RUST_LOG).
pub const LOG_ENV: &str = "CRC32PAR_LOG";

/// Reset SIGPIPE to default behavior (SIG_DFL).
/// Rust sets SIGPIPE to SIG_IGN by default, so `crc32par * | head` would
/// otherwise report a broken pipe instead of exiting quietly.
/// This must be called at the start of main().
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Format an IO error message without the "(os error N)" suffix.
/// The platform prints e.g. "No such file or directory" while Rust's
/// Display impl adds " (os error 2)".
pub fn io_error_msg(e: &std::io::Error) -> String {
    if let Some(raw) = e.raw_os_error() {
        let os_err = std::io::Error::from_raw_os_error(raw);
        let msg = format!("{}", os_err);
        msg.replace(&format!(" (os error {})", raw), "")
    } else {
        format!("{}", e)
    }
}

/// Initialize diagnostics on stderr.
///
/// The filter comes from `CRC32PAR_LOG`, then `RUST_LOG`, and defaults to
/// `warn`, so a normal run writes nothing but report lines.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init();
}
