//! Helpers for running instrumentation code next to user code.

use std::future::Future;

/// Runs `execute`, always reports the outcome to `on_finish`, then returns
/// the value or the error.
///
/// With `prevent_throwing_error`, an error is only reported to `on_finish`
/// and the call returns `Ok(None)`.
pub fn safe_execute_in_the_middle<T, E, F, C>(
    execute: F,
    on_finish: C,
    prevent_throwing_error: bool,
) -> Result<Option<T>, E>
where
    F: FnOnce() -> Result<T, E>,
    C: FnOnce(Option<&E>, Option<&T>),
{
    finish(execute(), on_finish, prevent_throwing_error)
}

/// Async counterpart of [`safe_execute_in_the_middle`].
pub async fn safe_execute_in_the_middle_async<T, E, Fut, C>(
    execute: Fut,
    on_finish: C,
    prevent_throwing_error: bool,
) -> Result<Option<T>, E>
where
    Fut: Future<Output = Result<T, E>>,
    C: FnOnce(Option<&E>, Option<&T>),
{
    finish(execute.await, on_finish, prevent_throwing_error)
}

fn finish<T, E, C>(outcome: Result<T, E>, on_finish: C, prevent_throwing_error: bool) -> Result<Option<T>, E>
where
    C: FnOnce(Option<&E>, Option<&T>),
{
    match outcome {
        Ok(value) => {
            on_finish(None, Some(&value));
            Ok(Some(value))
        }
        Err(e) => {
            on_finish(Some(&e), None);
            if prevent_throwing_error { Ok(None) } else { Err(e) }
        }
    }
}
