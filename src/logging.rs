//! Global `tracing` subscriber for the viewer and tests that want output.

use cfg_if::cfg_if;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Route events to the browser console.
        pub fn init() {
            let console = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(console)
                .try_init();

            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use std::ffi::OsString;
        use std::panic::PanicHookInfo;
        use std::path::{Path, PathBuf};

        use once_cell::sync::OnceCell;
        use tracing_appender::non_blocking::WorkerGuard;
        use tracing::Subscriber;
        use tracing_subscriber::fmt::{self, MakeWriter};
        use tracing_subscriber::registry::LookupSpan;
        use tracing_subscriber::Layer;

        /// Log file used when `RUST_LOG_FILE` is unset.
        pub const DEFAULT_LOG_FILE: &str = "logs/roam.log";
        /// Environment variable overriding [`DEFAULT_LOG_FILE`].
        pub const LOG_FILE_ENV: &str = "RUST_LOG_FILE";

        // Dropping the guard stops the background writer.
        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        /// Split a log file path into the rolling appender's directory and
        /// file-name prefix.
        pub fn log_file_location(path: &Path) -> (PathBuf, OsString) {
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let prefix = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| OsString::from("roam.log"));
            (directory, prefix)
        }

        fn compact_layer<S, W>(writer: W) -> impl Layer<S> + Send + Sync
        where
            S: Subscriber + for<'span> LookupSpan<'span>,
            W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
        {
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact()
        }

        fn log_panic(info: &PanicHookInfo<'_>) {
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_default();
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string panic>");
            let backtrace = std::backtrace::Backtrace::force_capture();
            tracing::error!(%location, "panic: {payload}\nBacktrace:\n{backtrace:?}");
        }

        /// Compact stderr output plus a daily-rotated, non-blocking log file,
        /// filtered by `RUST_LOG`. A second call is a no-op.
        pub fn init() {
            if FILE_GUARD.get().is_some() {
                return;
            }

            let path = std::env::var_os(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
            let (directory, prefix) = log_file_location(&path);
            let (file_writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix));
            let _ = FILE_GUARD.set(guard);

            let installed = tracing_subscriber::registry()
                .with(env_filter())
                .with(compact_layer(std::io::stderr))
                .with(compact_layer(file_writer))
                .try_init();
            if installed.is_ok() {
                std::panic::set_hook(Box::new(log_panic));
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn log_file_location_splits_directory_and_prefix() {
        let (dir, prefix) = log_file_location(Path::new("logs/roam.log"));
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(prefix, OsStr::new("roam.log"));

        let (dir, prefix) = log_file_location(Path::new("viewer.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(prefix, OsStr::new("viewer.log"));
    }
}
