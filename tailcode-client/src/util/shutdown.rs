//! Process-wide shutdown signal, cancelled on Ctrl+C.

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;

pub static SHUTDOWN: Lazy<CancellationToken> = Lazy::new(CancellationToken::new);
