/// A value read from an input, along with the warnings raised while reading it.
///
/// Warnings never prevent the value from being produced; they are forwarded to the warning handlers of the readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WarningResult<T> {
    value: T,
    warnings: Vec<String>,
}

impl<T> WarningResult<T> {
    pub(crate) fn ok(value: T) -> Self {
        Self {
            value,
            warnings: vec![],
        }
    }

    pub(crate) fn warned<S>(value: T, warning: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            value,
            warnings: vec![warning.into()],
        }
    }

    /// Appends the warnings of another result, discarding its value.
    pub(crate) fn absorb<U>(&mut self, other: WarningResult<U>) -> U {
        self.warnings.extend(other.warnings);
        other.value
    }

    /// Returns the value, passing each warning to the callback.
    pub(crate) fn consume_warnings<F>(self, mut f: F) -> T
    where
        F: FnMut(&str),
    {
        self.warnings.iter().for_each(|w| f(w));
        self.value
    }

    #[cfg(test)]
    pub(crate) fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl<T> FromIterator<WarningResult<T>> for WarningResult<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = WarningResult<T>>>(iter: I) -> Self {
        let mut result = WarningResult::ok(vec![]);
        for r in iter {
            let value = result.absorb(r);
            result.value.push(value);
        }
        result
    }
}
