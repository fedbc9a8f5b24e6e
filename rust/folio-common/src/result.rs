pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Fails the enclosing function with a format error for `$element` unless `$expr` holds.
#[macro_export]
macro_rules! verify_data {
    ($element:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, $element, stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_data(predicate: bool, element: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(element, condition)
    }
}

#[cold]
pub fn invalid_format(element: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: element.to_string(),
        message: condition.to_string(),
    }
    .into())
}
