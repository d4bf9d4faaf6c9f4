//! Human-readable dumps of request and response models.
//!
//! Each model lists its own fields explicitly:
//!
//! ```text
//! Card: {
//!     "number": 411111******1111
//!     "exp_month": 1
//! }
//! ```

use std::fmt::{Display, Write};

/// Formats a model as `TypeName: { "field": value ... }`.
pub trait Describe {
    /// Renders the model. Card numbers are masked and secrets omitted.
    fn describe(&self) -> String;
}

/// Builder for [`Describe`] output.
#[derive(Debug)]
pub struct Description {
    out: String,
}

impl Description {
    /// Starts a description of `type_name`.
    #[must_use]
    pub fn new(type_name: &str) -> Self {
        Self {
            out: format!("{type_name}: {{\n"),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Display) -> Self {
        let value = value.to_string();
        let _ = write!(self.out, "    \"{name}\": ");
        let mut lines = value.lines();
        if let Some(first) = lines.next() {
            self.out.push_str(first);
        }
        for line in lines {
            self.out.push_str("\n    ");
            self.out.push_str(line);
        }
        self.out.push('\n');
        self
    }

    /// Appends an optional field, rendering `None` as `nil`.
    #[must_use]
    pub fn optional<T: Display>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self.field(name, "nil"),
        }
    }

    /// Closes the description.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.out.push('}');
        self.out
    }
}

/// Masks all but the first six and last four characters.
#[must_use]
pub fn mask_card_number(number: &str) -> String {
    let count = number.chars().count();
    if count <= 10 {
        return "*".repeat(count);
    }
    number
        .chars()
        .enumerate()
        .map(|(i, c)| if i < 6 || i >= count - 4 { c } else { '*' })
        .collect()
}
