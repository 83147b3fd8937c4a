use crate::{Error, Result};
use rayon::ThreadPoolBuilder;
use std::env;
use std::sync::OnceLock;

pub const CPU_THREADS_ENV: &str = "MPASE_CPU_THREADS";

static THREAD_POOL_INIT: OnceLock<std::result::Result<usize, String>> = OnceLock::new();

/// Configure the global Rayon pool shared by the parallel pipeline stages.
///
/// Priority:
/// 1. `num_threads` argument
/// 2. `MPASE_CPU_THREADS` environment variable
/// 3. Rayon default
///
/// Only the first call has an effect; later calls report its outcome.
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<usize> {
    let res = THREAD_POOL_INIT.get_or_init(|| {
        let configured = match num_threads {
            Some(n) => Some(n),
            None => threads_from_env()?,
        };

        let mut builder = ThreadPoolBuilder::new();
        if let Some(n) = configured {
            if n == 0 {
                return Err(format!("{CPU_THREADS_ENV} must be >= 1"));
            }
            builder = builder.num_threads(n);
        }

        builder
            .build_global()
            .map(|_| rayon::current_num_threads())
            .map_err(|e| e.to_string())
    });
    res.clone().map_err(Error::Config)
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn threads_from_env() -> std::result::Result<Option<usize>, String> {
    let raw = match env::var(CPU_THREADS_ENV) {
        Ok(v) => v,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(e) => return Err(format!("failed to read {CPU_THREADS_ENV}: {e}")),
    };
    parse_thread_count(&raw).map(Some)
}

fn parse_thread_count(raw: &str) -> std::result::Result<usize, String> {
    let parsed: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("{CPU_THREADS_ENV} must be a positive integer, got '{raw}'"))?;
    if parsed == 0 {
        return Err(format!("{CPU_THREADS_ENV} must be >= 1"));
    }
    Ok(parsed)
}
