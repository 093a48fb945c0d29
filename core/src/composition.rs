//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Embed a child reducer in a parent feature by focusing
//!   its state, action and environment
//!
//! A shopper session combines a cart reducer and a checkout reducer this way:
//! each child owns a slice of the session state and only sees the actions
//! addressed to it.

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
///
/// # Examples
///
/// ```
/// use wedding_core::{smallvec, Effect, Reducer, SmallVec};
/// use wedding_core::composition::combine_reducers;
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: i32,
///     logged: bool,
/// }
///
/// #[derive(Clone)]
/// enum AppAction {
///     Increment,
///     Log,
/// }
///
/// struct CounterReducer;
/// struct LoggingReducer;
///
/// impl Reducer for CounterReducer {
///     type State = AppState;
///     type Action = AppAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
///         if matches!(action, AppAction::Increment) {
///             state.counter += 1;
///         }
///         smallvec![Effect::None]
///     }
/// }
///
/// impl Reducer for LoggingReducer {
///     type State = AppState;
///     type Action = AppAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
///         if matches!(action, AppAction::Log) {
///             state.logged = true;
///         }
///         smallvec![Effect::None]
///     }
/// }
///
/// let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(LoggingReducer)]);
///
/// let mut state = AppState::default();
/// let _ = combined.reduce(&mut state, AppAction::Increment, &());
/// assert_eq!(state.counter, 1);
/// ```
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Lenses that embed a child feature into a parent feature.
///
/// - `get_state` / `set_state` focus the parent state on the child slice
/// - `extract_action` picks out parent actions addressed to the child
///   (returning `None` skips the child reducer entirely)
/// - `embed_action` wraps child actions produced by effects
/// - `get_env` borrows the child's dependencies from the parent's
pub struct Scope<S, SubS, A, SubA, E, SubE> {
    /// Borrow the child state from the parent
    pub get_state: fn(&S) -> &SubS,
    /// Write the updated child state back
    pub set_state: fn(&mut S, SubS),
    /// Pick out child actions from parent actions
    pub extract_action: fn(A) -> Option<SubA>,
    /// Wrap a child action as a parent action
    pub embed_action: fn(SubA) -> A,
    /// Borrow the child environment from the parent
    pub get_env: fn(&E) -> &SubE,
}

/// Scopes a child reducer to operate on a subset of a larger feature.
///
/// # Examples
///
/// ```
/// use wedding_core::{smallvec, Effect, Reducer, SmallVec};
/// use wedding_core::composition::{scope_reducer, Scope};
///
/// #[derive(Clone, Default)]
/// struct CounterState {
///     count: i32,
/// }
///
/// #[derive(Clone, Debug)]
/// enum CounterAction {
///     Increment,
/// }
///
/// struct CounterReducer;
///
/// impl Reducer for CounterReducer {
///     type State = CounterState;
///     type Action = CounterAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut CounterState, _action: CounterAction, _env: &()) -> SmallVec<[Effect<CounterAction>; 4]> {
///         state.count += 1;
///         smallvec![Effect::None]
///     }
/// }
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: CounterState,
/// }
///
/// #[derive(Clone, Debug)]
/// enum AppAction {
///     Counter(CounterAction),
///     Other,
/// }
///
/// let scoped = scope_reducer(
///     CounterReducer,
///     Scope {
///         get_state: |s: &AppState| &s.counter,
///         set_state: |s: &mut AppState, c| s.counter = c,
///         extract_action: |a| match a {
///             AppAction::Counter(c) => Some(c),
///             AppAction::Other => None,
///         },
///         embed_action: AppAction::Counter,
///         get_env: |e: &()| e,
///     },
/// );
///
/// let mut state = AppState::default();
/// let _ = scoped.reduce(&mut state, AppAction::Counter(CounterAction::Increment), &());
/// let _ = scoped.reduce(&mut state, AppAction::Other, &());
/// assert_eq!(state.counter.count, 1);
/// ```
pub const fn scope_reducer<S, SubS, A, SubA, E, SubE, R>(
    reducer: R,
    scope: Scope<S, SubS, A, SubA, E, SubE>,
) -> ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    ScopedReducer { reducer, scope }
}

/// A scoped reducer that operates on a subset of a parent feature.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    reducer: R,
    scope: Scope<S, SubS, A, SubA, E, SubE>,
}

impl<S, SubS, A, SubA, E, SubE, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    SubS: Clone,
    A: Send + 'static,
    SubA: Send + 'static,
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(sub_action) = (self.scope.extract_action)(action) else {
            return SmallVec::new();
        };

        let mut sub_state = (self.scope.get_state)(state).clone();
        let effects = self
            .reducer
            .reduce(&mut sub_state, sub_action, (self.scope.get_env)(env));
        (self.scope.set_state)(state, sub_state);

        let embed = self.scope.embed_action;
        effects.into_iter().map(|effect| effect.map(embed)).collect()
    }
}
