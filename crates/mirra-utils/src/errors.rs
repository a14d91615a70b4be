use std::{
    fmt::{self, Display},
    slice, vec,
};

/// An error type which can represent multiple errors.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Errors<T> {
    errors: Vec<T>,
}

impl<T> Default for Errors<T> {
    fn default() -> Self {
        Errors::new()
    }
}

impl<T> Errors<T> {
    /// Creates a new, empty `Errors` instance.
    pub fn new() -> Errors<T> {
        Errors { errors: Vec::new() }
    }

    /// Returns true if `self` contains any errors
    pub fn has_errors(&self) -> bool {
        !self.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, t: T) {
        self.errors.push(t);
    }

    pub fn first(&self) -> Option<&T> {
        self.errors.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.errors.iter()
    }

    /// Returns `Ok(value)` if no errors were collected, otherwise all of them.
    pub fn into_result<V>(self, value: V) -> Result<V, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl<T> fmt::Display for Errors<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl<T> Extend<T> for Errors<T> {
    fn extend<Iter: IntoIterator<Item = T>>(&mut self, iter: Iter) {
        self.errors.extend(iter);
    }
}

impl<T> From<T> for Errors<T> {
    fn from(err: T) -> Errors<T> {
        Errors { errors: vec![err] }
    }
}

impl<T> FromIterator<T> for Errors<T> {
    fn from_iter<Iter: IntoIterator<Item = T>>(iter: Iter) -> Errors<T> {
        Errors {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Errors<T> {
    type Item = T;

    type IntoIter = vec::IntoIter<T>;

    fn into_iter(self) -> vec::IntoIter<T> {
        self.errors.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Errors<T> {
    type Item = &'a T;

    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Errors;

    #[test]
    fn empty_errors_yield_the_value() {
        let errors: Errors<&str> = Errors::new();
        assert_eq!(errors.into_result(42), Ok(42));
    }

    #[test]
    fn collected_errors_are_displayed_line_by_line() {
        let errors: Errors<&str> = ["first", "second"].into_iter().collect();
        assert!(errors.has_errors());
        assert_eq!(errors.to_string(), "first\nsecond");
        assert_eq!(errors.into_result(()).unwrap_err().len(), 2);
    }
}
