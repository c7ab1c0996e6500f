pub use anyhow;
pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
pub use std::result::Result as StdResult;

#[inline]
pub fn raise<T, Error>(err: Error) -> self::Result<T>
where
    Error: std::error::Error + Send + Sync + 'static,
{
    Err(err.into())
}

#[macro_export]
macro_rules! simple_error {
    ($fmt:expr $(, $arg:tt)*) => {
        $crate::result::anyhow::anyhow!($fmt $(, $arg)*)
    };
}
