//! Rule input syntax.
//!
//! ```text
//! "iphone case       anchored to the start of the query
//! iphone case"       anchored to the end of the query
//! "iphone"           the whole query must be exactly `iphone`
//! brand:apple        only matches terms of field `brand`
//! laptop*            prefix: matches `laptops`, `laptopbag`, ... (last token only)
//! ```

use crate::error::RuleError;

bitflags::bitflags! {
    /// Query edges a rule input is anchored to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Anchors: u8 {
        const LEFT  = 1 << 0;
        const RIGHT = 1 << 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputToken {
    pub field: Option<String>,
    pub value: String,
    /// The value is a prefix (the token ended with `*`).
    pub prefix: bool,
}

/// A parsed rule input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub anchors: Anchors,
    pub tokens: Vec<InputToken>,
}

impl Input {
    pub fn parse(text: &str, ignore_case: bool) -> Result<Input, RuleError> {
        let mut anchors = Anchors::empty();
        let mut body = text.trim();
        if let Some(rest) = body.strip_prefix('"') {
            anchors |= Anchors::LEFT;
            body = rest;
        }
        if let Some(rest) = body.strip_suffix('"') {
            anchors |= Anchors::RIGHT;
            body = rest;
        }

        let raw: Vec<&str> = regex!(r"\S+").find_iter(body).map(|m| m.as_str()).collect();
        if raw.is_empty() && anchors.is_empty() {
            return Err(RuleError::EmptyInput);
        }

        let mut tokens = Vec::with_capacity(raw.len());
        for (idx, token) in raw.iter().enumerate() {
            let is_last = idx + 1 == raw.len();
            tokens.push(parse_token(token, is_last, ignore_case)?);
        }

        Ok(Input { anchors, tokens })
    }
}

fn parse_token(token: &str, is_last: bool, ignore_case: bool) -> Result<InputToken, RuleError> {
    let caps = regex!(r"^(?:([^:]*):)?(.*)$")
        .captures(token)
        .ok_or_else(|| RuleError::EmptyToken(token.to_string()))?;

    let field = match caps.get(1) {
        Some(f) if f.as_str().is_empty() => return Err(RuleError::EmptyToken(token.to_string())),
        Some(f) => Some(f.as_str().to_string()),
        None => None,
    };
    let mut value = caps.get(2).map(|v| v.as_str()).unwrap_or_default();

    let prefix = value.ends_with('*');
    if prefix {
        value = &value[..value.len() - 1];
    }
    if value.contains('*') || (prefix && !is_last) {
        return Err(RuleError::MisplacedWildcard(token.to_string()));
    }
    if value.is_empty() {
        return Err(RuleError::EmptyToken(token.to_string()));
    }

    let value = if ignore_case { value.to_lowercase() } else { value.to_string() };
    Ok(InputToken { field, value, prefix })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(field: Option<&str>, value: &str, prefix: bool) -> InputToken {
        InputToken { field: field.map(str::to_string), value: value.to_string(), prefix }
    }

    #[test]
    fn parses_anchors_fields_and_prefixes() {
        let input = Input::parse("\"Brand:Apple iPhone*\"", true).unwrap();
        assert_eq!(input.anchors, Anchors::LEFT | Anchors::RIGHT);
        assert_eq!(input.tokens, vec![token(Some("Brand"), "apple", false), token(None, "iphone", true)]);

        let input = Input::parse("  laptop bag\" ", false).unwrap();
        assert_eq!(input.anchors, Anchors::RIGHT);
        assert_eq!(input.tokens, vec![token(None, "laptop", false), token(None, "bag", false)]);
    }

    #[test]
    fn anchors_alone_are_valid() {
        let input = Input::parse("\"\"", true).unwrap();
        assert_eq!(input.anchors, Anchors::LEFT | Anchors::RIGHT);
        assert!(input.tokens.is_empty());

        let input = Input::parse("\"", true).unwrap();
        assert_eq!(input.anchors, Anchors::LEFT);
    }

    #[test]
    fn rejects_malformed_inputs() {
        assert_eq!(Input::parse("   ", true), Err(RuleError::EmptyInput));
        assert_eq!(Input::parse("lap* top", true), Err(RuleError::MisplacedWildcard("lap*".into())));
        assert_eq!(Input::parse("l*p", true), Err(RuleError::MisplacedWildcard("l*p".into())));
        assert_eq!(Input::parse("a *", true), Err(RuleError::EmptyToken("*".into())));
        assert_eq!(Input::parse(":apple", true), Err(RuleError::EmptyToken(":apple".into())));
        assert_eq!(Input::parse("brand:", true), Err(RuleError::EmptyToken("brand:".into())));
    }
}
