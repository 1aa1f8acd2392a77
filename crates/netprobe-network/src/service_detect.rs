//! Service naming for probed ports
//!
//! Open ports are named from the well-known table, then the OS services
//! database, then a fixed fallback label. Closed ports only consult the
//! well-known table.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::ports::well_known_service;

/// Label for a closed port missing from the well-known table
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Label for an open port neither the table nor the OS can name
pub const OPEN_SERVICE_FALLBACK: &str = "Unrecognized";

/// A source of port-to-service names beyond the well-known table
pub trait ServiceResolver: Send + Sync {
    /// Name the service conventionally bound to `port`, if known
    fn lookup(&self, port: u16) -> Option<String>;
}

/// Resolver backed by the operating system's services database
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemServiceResolver;

#[cfg(unix)]
impl ServiceResolver for SystemServiceResolver {
    fn lookup(&self, port: u16) -> Option<String> {
        use std::ffi::CStr;
        use std::sync::Mutex;

        // getservbyport returns a pointer into static storage shared by all callers.
        static SERVICES_DB: Mutex<()> = Mutex::new(());
        let _guard = SERVICES_DB.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // SAFETY: the port is passed in network byte order as the C API
        // expects, a null protocol matches any protocol, and the returned
        // entry is copied out before the lock is released.
        unsafe {
            let entry = libc::getservbyport(libc::c_int::from(port.to_be()), std::ptr::null());
            if entry.is_null() || (*entry).s_name.is_null() {
                return None;
            }
            let name = CStr::from_ptr((*entry).s_name).to_string_lossy().into_owned();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }
}

#[cfg(not(unix))]
impl ServiceResolver for SystemServiceResolver {
    fn lookup(&self, _port: u16) -> Option<String> {
        None
    }
}

/// Names services for probe results
#[derive(Clone)]
pub struct ServiceDetector {
    resolver: Arc<dyn ServiceResolver>,
}

impl ServiceDetector {
    /// Create a detector that falls back to the OS services database
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(SystemServiceResolver))
    }

    /// Create a detector with a custom fallback resolver
    pub fn with_resolver(resolver: Arc<dyn ServiceResolver>) -> Self {
        Self { resolver }
    }

    /// Name an open port: table, then resolver, then [`OPEN_SERVICE_FALLBACK`].
    ///
    /// The resolver may block, so it runs on the blocking pool.
    pub async fn open_port_service(&self, port: u16) -> String {
        if let Some(name) = well_known_service(port) {
            return name.to_string();
        }

        let resolver = Arc::clone(&self.resolver);
        match tokio::task::spawn_blocking(move || resolver.lookup(port)).await {
            Ok(Some(name)) => {
                trace!("Resolved port {} to service {}", port, name);
                name
            }
            Ok(None) => OPEN_SERVICE_FALLBACK.to_string(),
            Err(e) => {
                debug!("Service lookup for port {} failed: {}", port, e);
                OPEN_SERVICE_FALLBACK.to_string()
            }
        }
    }

    /// Name a closed port from the table only, defaulting to [`UNKNOWN_SERVICE`]
    pub fn closed_port_service(&self, port: u16) -> String {
        well_known_service(port)
            .unwrap_or(UNKNOWN_SERVICE)
            .to_string()
    }
}

impl Default for ServiceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDetector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedResolver(Option<&'static str>);

    impl ServiceResolver for FixedResolver {
        fn lookup(&self, _port: u16) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[derive(Default)]
    struct CountingResolver(AtomicUsize);

    impl ServiceResolver for CountingResolver {
        fn lookup(&self, _port: u16) -> Option<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Some("counted".into())
        }
    }

    #[tokio::test]
    async fn test_open_port_prefers_table() {
        let detector = ServiceDetector::with_resolver(Arc::new(FixedResolver(Some("ssh"))));
        assert_eq!(detector.open_port_service(22).await, "SSH");
    }

    #[tokio::test]
    async fn test_open_port_uses_resolver() {
        let detector = ServiceDetector::with_resolver(Arc::new(FixedResolver(Some("http-alt"))));
        assert_eq!(detector.open_port_service(8080).await, "http-alt");
    }

    #[tokio::test]
    async fn test_open_port_fallback() {
        let detector = ServiceDetector::with_resolver(Arc::new(FixedResolver(None)));
        assert_eq!(detector.open_port_service(40000).await, OPEN_SERVICE_FALLBACK);
    }

    #[test]
    fn test_closed_port_never_consults_resolver() {
        let resolver = Arc::new(CountingResolver::default());
        let detector = ServiceDetector::with_resolver(resolver.clone());

        assert_eq!(detector.closed_port_service(9999), UNKNOWN_SERVICE);
        assert_eq!(detector.closed_port_service(8080), UNKNOWN_SERVICE);
        assert_eq!(detector.closed_port_service(443), "SSL");
        assert_eq!(resolver.0.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_resolver_does_not_panic() {
        // Contents of the services database vary between hosts
        let _ = SystemServiceResolver.lookup(8080);
        let _ = SystemServiceResolver.lookup(1);
    }
}
