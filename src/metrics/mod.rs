//! Metrics and observability infrastructure for flurry.
//!
//! Internal events are emitted through the `metrics` facade. The library
//! never installs a recorder; the host process decides where metrics go.

pub mod events;

/// Emit an internal event.
///
/// This macro calls the `InternalEvent::emit()` method on the given event,
/// which records the corresponding counter, gauge or histogram.
///
/// # Example
///
/// ```ignore
/// use flurry::metrics::events::RecordsDecoded;
///
/// emit!(RecordsDecoded { count: 100 });
/// ```
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::events::InternalEvent::emit($event)
    };
}
