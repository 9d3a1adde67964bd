// vim: tw=80
//! Argument values, their canonical form, and their diagnostic rendering.

use std::fmt::{self, Display, Formatter};

use serde_json::Number;
use sha2::{Digest, Sha256};

/// A single argument or response value.
///
/// Maps keep their declaration order, which is what gets rendered in
/// diagnostics.  Equality between argument lists ignores map key order; see
/// [`Fingerprint`].
pub use serde_json::Value;

/// Build an argument list.
///
/// Every element uses [`json!`](macro@crate::json) syntax, so scalars, lists
/// and maps can be mixed freely.
///
/// # Examples
/// ```
/// # use dynamock::*;
/// let args = args!["Items.GetList", {"page": 1, "per_page": 2}, [1, 2]];
/// assert_eq!(args.len(), 3);
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:tt)+) => {
        match $crate::json!([$($arg)+]) {
            $crate::Value::Array(args) => args,
            _ => unreachable!("json! array literal")
        }
    };
}

/// Rebuild `value` with the keys of every map, at every depth, in sorted
/// order.  Lists keep their element order.  Whole-valued floats become
/// integers, so `2.0` and `2` are the same argument.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries = map.iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(entries.into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect())
        },
        Value::Array(items) => {
            Value::Array(items.iter().map(canonicalize).collect())
        },
        Value::Number(n) => {
            Value::Number(integral(n).unwrap_or_else(|| n.clone()))
        },
        scalar => scalar.clone()
    }
}

/// The integer equal to `n`, if `n` is a float with no fractional part that
/// fits in an `i64` or `u64`.
fn integral(n: &Number) -> Option<Number> {
    let f = n.as_f64().filter(|_| n.is_f64())?;
    if f.fract() != 0.0 {
        // Infinities have a NaN fract
        return None;
    }
    // u64::MAX rounds up to 2^64 as an f64
    if f >= 0.0 && f < u64::MAX as f64 {
        Some(Number::from(f as u64))
    } else if f < 0.0 && f >= i64::MIN as f64 {
        Some(Number::from(f as i64))
    } else {
        None
    }
}

/// Digest of an argument list's canonical form.
///
/// Two argument lists have the same fingerprint exactly when they are
/// positionally equal after [`canonicalize`], so `{"a": 1, "b": 2}` and
/// `{"b": 2, "a": 1}` are interchangeable while `[1, 2]` and `[2, 1]` are
/// not.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(args: &[Value]) -> Self {
        let canonical = Value::Array(args.iter().map(canonicalize).collect());
        // Value's Display is the compact JSON serialization
        let digest = Sha256::digest(canonical.to_string().as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Fingerprint(bytes)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Human-readable dump of an argument list.
///
/// Containers print as an `Array` block with one `[key] => value` line per
/// entry; lists use positional keys.  Nested blocks are indented eight columns
/// deeper than their parent.  The output always ends with a newline.
///
/// ```
/// # use dynamock::*;
/// let rendered = Dump(&args![24]).to_string();
/// assert_eq!(rendered, "Array\n(\n    [0] => 24\n)\n");
/// ```
pub struct Dump<'a>(pub &'a [Value]);

impl Display for Dump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let entries = self.0.iter()
            .enumerate()
            .map(|(i, v)| (Key::Index(i), v));
        dump_entries(f, entries, 0)
    }
}

enum Key<'a> {
    Index(usize),
    Name(&'a str)
}

impl Display for Key<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => f.write_str(name)
        }
    }
}

fn dump_entries<'a, I>(f: &mut Formatter<'_>, entries: I, depth: usize)
    -> fmt::Result
    where I: Iterator<Item=(Key<'a>, &'a Value)>
{
    let pad = " ".repeat(depth * 8);
    write!(f, "Array\n{}(\n", pad)?;
    for (key, value) in entries {
        write!(f, "{}    [{}] => ", pad, key)?;
        dump_value(f, value, depth + 1)?;
        f.write_str("\n")?;
    }
    writeln!(f, "{})", pad)
}

fn dump_value(f: &mut Formatter<'_>, value: &Value, depth: usize)
    -> fmt::Result
{
    match value {
        Value::Array(items) => {
            let entries = items.iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v));
            dump_entries(f, entries, depth)
        },
        Value::Object(map) => {
            let entries = map.iter().map(|(k, v)| (Key::Name(k), v));
            dump_entries(f, entries, depth)
        },
        Value::String(s) => f.write_str(s),
        scalar => write!(f, "{}", scalar)
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonicalize_sorts_nested_maps() {
        let value = json!({"b": {"y": 1, "x": [ {"d": 0, "c": 1} ]}, "a": 2});
        let canonical = canonicalize(&value);
        assert_eq!(canonical.to_string(),
            r#"{"a":2,"b":{"x":[{"c":1,"d":0}],"y":1}}"#);
    }

    #[test]
    fn fingerprint_ignores_key_order() {
        let a = [json!({"a": 1, "b": {"c": 3, "d": 4}})];
        let b = [json!({"b": {"d": 4, "c": 3}, "a": 1})];
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn whole_floats_are_integers() {
        assert_eq!(canonicalize(&json!(2.0)).to_string(), "2");
        assert_eq!(canonicalize(&json!(-7.0)).to_string(), "-7");
        assert_eq!(canonicalize(&json!(-0.0)).to_string(), "0");
        assert_eq!(canonicalize(&json!(2.5)).to_string(), "2.5");
        assert_eq!(canonicalize(&json!(1e300)).to_string(), "1e300");
        assert_eq!(canonicalize(&json!({"x": [3.0]})).to_string(),
            r#"{"x":[3]}"#);
    }

    #[test]
    fn fingerprint_respects_position() {
        let a = [json!(1), json!(2)];
        let b = [json!(2), json!(1)];
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
        let c = [json!([1, 2])];
        let d = [json!([2, 1])];
        assert_ne!(Fingerprint::of(&c), Fingerprint::of(&d));
    }

    #[test]
    fn fingerprint_display_is_hex() {
        let s = Fingerprint::of(&[]).to_string();
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn dump_nested() {
        let args = [json!("23"), json!([1, 2]), json!({"k": true})];
        let expected = "Array
(
    [0] => 23
    [1] => Array
        (
            [0] => 1
            [1] => 2
        )

    [2] => Array
        (
            [k] => true
        )

)
";
        assert_eq!(Dump(&args).to_string(), expected);
    }

    #[test]
    fn dump_empty() {
        assert_eq!(Dump(&[]).to_string(), "Array\n(\n)\n");
    }
}
