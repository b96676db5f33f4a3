/// Install a `fmt` subscriber for `tracing` output.
///
/// Returns `false` if a global subscriber was already set, which leaves it
/// in place.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt().try_init().is_ok()
}
