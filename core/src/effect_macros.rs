//! Declarative macros for ergonomic effect construction
//!
//! Reduces boilerplate when a reducer schedules work instead of mutating its
//! draft directly.

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use reactive_store_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_millis(100),
///     action: TodoAction::TodoAdded { todo }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
