use std::{
    fmt,
    fmt::{Debug, Display},
};

/// Wrapper for configuration values that must never end up in logs or debug dumps.
///
/// Access to the inner value is always an explicit `reveal()` call at the site that needs it.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_are_masked_in_output() {
        let secret = Secret::new("sk_test_abcdef".to_string());
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.reveal(), "sk_test_abcdef");
    }
}
