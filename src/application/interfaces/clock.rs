/// Source of wall-clock time, in Unix seconds.
///
/// Injected into the session store so expiry can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}
