//! Shorthand for building effects inside reducers.

/// Wrap an async block into an [`Effect::Future`](crate::effect::Effect::Future).
///
/// The block evaluates to `Option<Action>`; captured values are moved in.
///
/// ```rust,ignore
/// use wedding_core::async_effect;
///
/// let card = Arc::clone(&env.card);
/// smallvec![async_effect! {
///     Some(match card.create_intent(request).await {
///         Ok(intent) => CheckoutAction::CardIntentCreated { attempt, handle: intent.into() },
///         Err(err) => CheckoutAction::PaymentFailed { attempt, error: err.to_string() },
///     })
/// }]
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}
