//! Termination signals cancel an in-flight fetch.
//!
//! The first `SIGINT` or `SIGTERM` sets the cancellation flag so the fetcher
//! can stop its child and the dispatcher can release the workspace. A second
//! signal terminates the process immediately.

use std::io;
use std::sync::Arc;

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use skein_plugins::CancelToken;

pub(crate) fn register(cancel: &CancelToken) -> io::Result<()> {
    let requested = cancel.flag();
    for &signal in TERM_SIGNALS {
        // Registered first so it observes the flag before this signal sets it.
        flag::register_conditional_shutdown(signal, 1, Arc::clone(&requested))?;
        flag::register(signal, Arc::clone(&requested))?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use signal_hook::consts::SIGTERM;
    use signal_hook::low_level::raise;

    use super::*;

    #[test]
    fn first_signal_cancels_the_token() {
        let cancel = CancelToken::new();
        register(&cancel).expect("register handlers");
        raise(SIGTERM).expect("raise signal");
        assert!(cancel.is_cancelled());
    }
}
