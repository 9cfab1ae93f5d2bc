use core_types::{Params, SqlValue};

/// How a dialect spells its placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ... bound by position.
    Numbered,
    /// `:p1`, `:limit`, ... bound by name.
    Named,
}

/// Collects bind values while a statement is rendered and hands out the
/// matching placeholder text.
#[derive(Debug, Clone)]
pub struct Binder {
    style: PlaceholderStyle,
    positional: Vec<SqlValue>,
    named: Vec<(String, SqlValue)>,
    counter: usize,
}

impl Binder {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            positional: Vec::new(),
            named: Vec::new(),
            counter: 0,
        }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Binds an anonymous value (`$n` or `:pN`).
    pub fn bind(&mut self, value: SqlValue) -> String {
        match self.style {
            PlaceholderStyle::Numbered => {
                self.positional.push(value);
                format!("${}", self.positional.len())
            }
            PlaceholderStyle::Named => {
                self.counter += 1;
                let name = format!("p{}", self.counter);
                let placeholder = format!(":{name}");
                self.named.push((name, value));
                placeholder
            }
        }
    }

    /// Binds a value under a readable name when the dialect supports names.
    pub fn bind_named(&mut self, name: &str, value: SqlValue) -> String {
        match self.style {
            PlaceholderStyle::Numbered => self.bind(value),
            PlaceholderStyle::Named => {
                self.named.push((name.to_string(), value));
                format!(":{name}")
            }
        }
    }

    pub fn into_params(self) -> Params {
        match self.style {
            PlaceholderStyle::Numbered => Params::Positional(self.positional),
            PlaceholderStyle::Named => Params::Named(self.named),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_placeholders_count_up() {
        let mut binder = Binder::new(PlaceholderStyle::Numbered);
        assert_eq!(binder.bind(SqlValue::Int(1)), "$1");
        assert_eq!(binder.bind_named("limit", SqlValue::Int(10)), "$2");
        assert_eq!(
            binder.into_params(),
            Params::Positional(vec![SqlValue::Int(1), SqlValue::Int(10)])
        );
    }

    #[test]
    fn named_placeholders_use_generated_and_given_names() {
        let mut binder = Binder::new(PlaceholderStyle::Named);
        assert_eq!(binder.bind("A1".into()), ":p1");
        assert_eq!(binder.bind_named("limit", SqlValue::Int(10)), ":limit");
        assert_eq!(binder.bind("B2".into()), ":p2");
        assert_eq!(
            binder.into_params(),
            Params::Named(vec![
                ("p1".into(), "A1".into()),
                ("limit".into(), SqlValue::Int(10)),
                ("p2".into(), "B2".into()),
            ])
        );
    }
}
