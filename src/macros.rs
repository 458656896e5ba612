// ============================================================================
// spark-logic - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// Holders, scopes and binders are cheap `Rc` handles; this removes the
/// boilerplate of cloning them before moving them into a listener.
///
/// # Usage
///
/// ```rust
/// use spark_logic::{Logic, cloned, logic_state};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// struct Counter(i32);
/// logic_state!(Counter => "counter");
///
/// let counter = Logic::new(Counter(0));
/// let seen = Rc::new(Cell::new(0));
///
/// counter.subscribe(cloned!(counter, seen => move || {
///     seen.set(counter.read(|c| c.0));
/// }));
///
/// counter.mutate(|c| c.0 = 7);
/// assert_eq!(seen.get(), 7);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Implement [`LogicState`](crate::LogicState) for a type.
///
/// The key is the lookup identity inside a scope. Without an explicit key
/// the type's name is used.
///
/// # Usage
///
/// ```rust
/// use spark_logic::{LogicState, logic_state};
///
/// struct Counter(i32);
/// logic_state!(Counter => "app.counter");
///
/// struct Theme;
/// logic_state!(Theme);
///
/// assert_eq!(Counter::KEY.as_str(), "app.counter");
/// assert_eq!(Theme::KEY.as_str(), "Theme");
/// ```
#[macro_export]
macro_rules! logic_state {
    // Case 1: Explicit key
    ($ty:ty => $key:expr) => {
        impl $crate::LogicState for $ty {
            const KEY: $crate::LogicKey = $crate::LogicKey::new($key);
        }
    };
    // Case 2: Key from the type name
    ($ty:ty) => {
        impl $crate::LogicState for $ty {
            const KEY: $crate::LogicKey = $crate::LogicKey::new(stringify!($ty));
        }
    };
}
