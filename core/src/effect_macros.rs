//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// The block evaluates to `Option<Action>`; `Some` is fed back into the reducer.
///
/// # Example
///
/// ```rust
/// use horizon_core::async_effect;
/// use horizon_core::effect::Effect;
///
/// #[derive(Debug)]
/// enum CheckoutAction {
///     Settled { ok: bool },
/// }
///
/// let effect: Effect<CheckoutAction> = async_effect! {
///     Some(CheckoutAction::Settled { ok: true })
/// };
/// assert!(matches!(effect, Effect::Future(_)));
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust
/// use horizon_core::delay;
/// use horizon_core::effect::Effect;
/// use std::time::Duration;
///
/// #[derive(Debug)]
/// enum CheckoutAction {
///     HoldExpired,
/// }
///
/// let effect: Effect<CheckoutAction> = delay! {
///     duration: Duration::from_secs(30),
///     action: CheckoutAction::HoldExpired
/// };
/// assert!(matches!(effect, Effect::Delay { .. }));
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
