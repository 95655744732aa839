//! # AgriGuard Testing
//!
//! Testing utilities and helpers for AgriGuard reducers.
//!
//! This crate provides:
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for returned effects
//! - An effect runner that executes effect descriptions without a store
//!
//! ## Example
//!
//! ```ignore
//! use agriguard_testing::{ReducerTest, effects::run_effects};
//!
//! #[tokio::test]
//! async fn logout_clears_session() {
//!     let mut state = signed_in_state();
//!     let effects = reducer.reduce(&mut state, AuthAction::Logout, &env);
//!     let follow_ups = run_effects(effects).await;
//!     assert!(follow_ups.is_empty());
//! }
//! ```

mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Executes effect descriptions outside of a store
///
/// Useful for reducer tests that need to observe what an effect does
/// (for example which action it feeds back) without running a full
/// runtime loop.
pub mod effects {
    use agriguard_core::effect::Effect;
    use futures::future::{join_all, BoxFuture};
    use futures::FutureExt;

    /// Run every effect and collect the actions they produce
    ///
    /// Produced actions are NOT fed back into any reducer. `Parallel`
    /// branches run concurrently and their actions are returned in branch
    /// order; `Sequential` branches run one after another.
    pub async fn run_effects<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut produced = Vec::new();
        for effect in effects {
            produced.extend(run_effect(effect).await);
        }
        produced
    }

    /// Run a single effect tree and collect the actions it produces
    pub fn run_effect<A>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>>
    where
        A: Send + 'static,
    {
        async move {
            match effect {
                Effect::None => Vec::new(),
                Effect::Future(fut) => fut.await.into_iter().collect(),
                Effect::Parallel(effects) => join_all(effects.into_iter().map(run_effect))
                    .await
                    .into_iter()
                    .flatten()
                    .collect(),
                Effect::Sequential(effects) => {
                    let mut produced = Vec::new();
                    for effect in effects {
                        produced.extend(run_effect(effect).await);
                    }
                    produced
                },
            }
        }
        .boxed()
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-friendly tracing subscriber
    ///
    /// Honors `RUST_LOG`, writes through the test harness capture and is
    /// safe to call from every test (later calls are ignored).
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}
