//! `application/x-www-form-urlencoded` rendering of parameter sets.
//!
//! Pairs are emitted in insertion order under catalog wire names. Nested sets
//! flatten to `parent[child]=value`; the brackets are percent-encoded like
//! any other reserved character.

use url::form_urlencoded;

use crate::catalog::Field;
use crate::error::ParseError;
use crate::params::{ParamValue, ParameterSet};

/// Content type of bodies produced by [`encode_query`].
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Encodes a parameter set as a form body or query string.
#[must_use]
pub fn encode_query(params: &ParameterSet) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    append_pairs(&mut serializer, None, params);
    serializer.finish()
}

fn append_pairs(
    serializer: &mut form_urlencoded::Serializer<'_, String>,
    prefix: Option<&str>,
    params: &ParameterSet,
) {
    for (field, value) in params.iter() {
        let name = match prefix {
            Some(prefix) => format!("{prefix}[{}]", field.wire_name()),
            None => field.wire_name().to_owned(),
        };
        match value {
            ParamValue::Text(text) => {
                serializer.append_pair(&name, text);
            }
            ParamValue::Integer(n) => {
                serializer.append_pair(&name, &n.to_string());
            }
            ParamValue::Nested(nested) => append_pairs(serializer, Some(&name), nested),
        }
    }
}

/// Decodes a form body or query string back into a parameter set.
///
/// Every value comes back as [`ParamValue::Text`]: the wire form does not
/// record whether a value was an integer.
///
/// # Errors
///
/// Returns [`ParseError::UnknownParameter`] for a name outside the catalog and
/// [`ParseError::InvalidField`] when a name is used both as a scalar and as a
/// nested parent.
pub fn decode_query(input: &str) -> Result<ParameterSet, ParseError> {
    let mut set = ParameterSet::new();
    for (name, value) in form_urlencoded::parse(input.as_bytes()) {
        let path = parse_name(&name)?;
        insert_path(&mut set, &path, value.into_owned())?;
    }
    Ok(set)
}

/// Splits `a[b][c]` into catalog fields.
fn parse_name(name: &str) -> Result<Vec<Field>, ParseError> {
    let unknown = || ParseError::UnknownParameter(name.to_owned());
    let (head, mut rest) = name.find('[').map_or((name, ""), |i| name.split_at(i));
    let mut path = vec![Field::from_wire_name(head).ok_or_else(unknown)?];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(unknown)?;
        let end = inner.find(']').ok_or_else(unknown)?;
        path.push(Field::from_wire_name(&inner[..end]).ok_or_else(unknown)?);
        rest = &inner[end + 1..];
    }
    Ok(path)
}

fn insert_path(set: &mut ParameterSet, path: &[Field], value: String) -> Result<(), ParseError> {
    match path {
        [] => Ok(()),
        [field] => {
            set.insert(*field, value);
            Ok(())
        }
        [parent, rest @ ..] => {
            if !set.contains(*parent) {
                set.insert(*parent, ParameterSet::new());
            }
            match set.get_mut(*parent) {
                Some(ParamValue::Nested(nested)) => insert_path(nested, rest, value),
                _ => Err(ParseError::InvalidField {
                    field: *parent,
                    reason: "used both as a value and as a nested parent".to_owned(),
                }),
            }
        }
    }
}
