//! Per-type value codecs and the factory that builds them.
//!
//! A codec converts one scalar between its wire token and a typed [`Value`].
//! Codecs are built lazily from [`TypeDesc`] descriptors and cached by the
//! factory; identityref codecs capture the module of the leaf they decode
//! for, so they (and any union containing one) bypass the cache.
//!
//! Decoding accepts both the quoted and the bare spelling of numeric
//! literals, whatever the configured wire variant; the variant only decides
//! how values are spelled on output. That keeps one parser usable for input
//! produced by either convention, and it is also what makes predicate
//! literals inside instance-identifiers (always strings) decodable with the
//! same codecs.

use crate::iid;
use crate::qname::{ModuleId, QName};
use crate::schema::{SchemaContext, TypeDesc};
use crate::token::{Scalar, TokenWriter};
use crate::util::{encode_error, invalid_value, CodecResult};
use crate::value::{Decimal64, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// Which JSON spelling convention the factory targets.
///
/// The two conventions differ only in how 64-bit integers and decimal64
/// values are written: [`WireVariant::Rfc7951`] quotes them as strings,
/// [`WireVariant::Draft`] writes them as bare JSON numbers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireVariant {
    /// RFC 7951 spelling; 64-bit integers and decimal64 are strings.
    Rfc7951,
    /// The earlier draft spelling; all numbers are bare JSON numbers.
    Draft,
}

/// A scalar codec for one resolved type.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonCodec {
    /// Any of the eight integer types.
    Int {
        /// True for int8..int64, false for uint8..uint64.
        signed: bool,
        /// Width in bits: 8, 16, 32 or 64.
        bits: u8,
        /// Spell output as a quoted string.
        quoted: bool,
    },
    /// Fixed-point decimal.
    Decimal64 {
        /// Declared scale of the leaf.
        fraction_digits: u8,
        /// Spell output as a quoted string.
        quoted: bool,
    },
    /// JSON boolean.
    Boolean,
    /// The empty type, spelled `[null]`.
    Empty,
    /// An unconstrained string.
    PlainString,
    /// Base64-encoded binary.
    Binary,
    /// Named bits; the value is a space-separated subset of the names.
    Bits {
        /// Declared bit names with their positions.
        names: Vec<(String, u32)>,
    },
    /// One name out of a declared set.
    Enumeration {
        /// Declared enum names.
        names: Vec<String>,
    },
    /// A reference to an identity derived from `base`.
    IdentityRef {
        /// The base identity values must be derived from.
        base: QName,
        /// The module of the leaf, which unprefixed names resolve against.
        context: ModuleId,
    },
    /// A path to a data node instance.
    InstanceIdentifier {
        /// Spelling convention for nested predicate decoding.
        variant: WireVariant,
    },
    /// Member codecs in declared order; decode tries them first to last.
    Union {
        /// Member codecs.
        members: Vec<JsonCodec>,
    },
}

impl JsonCodec {
    /// Decode one wire scalar into a typed value.
    ///
    /// Errors carry no path; the caller's traversal state machine fills the
    /// position in.
    pub fn decode(&self, scalar: &Scalar, model: &SchemaContext) -> CodecResult<Value> {
        match self {
            JsonCodec::Int { signed, bits, .. } => {
                let text = numeric_text(scalar)?;
                let n: i128 = text
                    .parse()
                    .map_err(|_| invalid_value(format!("'{}' is not a valid integer", text)))?;
                int_value(*signed, *bits, n)
            }
            JsonCodec::Decimal64 {
                fraction_digits, ..
            } => {
                let text = numeric_text(scalar)?;
                parse_decimal(text, *fraction_digits).map(Value::Decimal64)
            }
            JsonCodec::Boolean => match scalar {
                Scalar::Bool(b) => Ok(Value::Boolean(*b)),
                // Predicate literals spell booleans as strings.
                Scalar::String(s) if s == "true" => Ok(Value::Boolean(true)),
                Scalar::String(s) if s == "false" => Ok(Value::Boolean(false)),
                other => Err(invalid_value(format!(
                    "'{}' is not a boolean",
                    other.text()
                ))),
            },
            JsonCodec::Empty => match scalar {
                Scalar::Null => Ok(Value::Empty),
                other => Err(invalid_value(format!(
                    "'{}' is not a valid empty value",
                    other.text()
                ))),
            },
            JsonCodec::PlainString => match scalar {
                Scalar::String(s) => Ok(Value::String(s.clone())),
                other => Err(invalid_value(format!(
                    "expected a string, found '{}'",
                    other.text()
                ))),
            },
            JsonCodec::Binary => match scalar {
                Scalar::String(s) => base64::decode(s)
                    .map(Value::Binary)
                    .map_err(|e| invalid_value(format!("invalid base64: {}", e))),
                other => Err(invalid_value(format!(
                    "expected a base64 string, found '{}'",
                    other.text()
                ))),
            },
            JsonCodec::Bits { names } => match scalar {
                Scalar::String(s) => decode_bits(s, names),
                other => Err(invalid_value(format!(
                    "expected a bits string, found '{}'",
                    other.text()
                ))),
            },
            JsonCodec::Enumeration { names } => match scalar {
                Scalar::String(s) if names.iter().any(|n| n == s) => Ok(Value::Enum(s.clone())),
                other => Err(invalid_value(format!(
                    "'{}' is not an enum member",
                    other.text()
                ))),
            },
            JsonCodec::IdentityRef { base, context } => match scalar {
                Scalar::String(s) => decode_identityref(s, base, context, model),
                other => Err(invalid_value(format!(
                    "expected an identity name, found '{}'",
                    other.text()
                ))),
            },
            JsonCodec::InstanceIdentifier { variant } => match scalar {
                Scalar::String(s) => {
                    iid::parse(s, model, *variant).map(Value::InstanceIdentifier)
                }
                other => Err(invalid_value(format!(
                    "expected an instance-identifier string, found '{}'",
                    other.text()
                ))),
            },
            JsonCodec::Union { members } => {
                for member in members {
                    if let Ok(value) = member.decode(scalar, model) {
                        return Ok(value);
                    }
                }
                Err(invalid_value(format!(
                    "'{}' does not match any member type of the union",
                    scalar.text()
                )))
            }
        }
    }

    /// Encode one typed value as its wire scalar.
    pub fn encode(
        &self,
        value: &Value,
        model: &SchemaContext,
        out: &mut dyn TokenWriter,
    ) -> CodecResult<()> {
        match self {
            JsonCodec::Int { quoted, .. } | JsonCodec::Decimal64 { quoted, .. } => {
                let text = self.literal_text(value, model)?;
                if *quoted {
                    out.string_value(&text)
                } else {
                    out.number_value(&text)
                }
            }
            JsonCodec::Boolean => match value {
                Value::Boolean(b) => out.bool_value(*b),
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Empty => match value {
                Value::Empty => {
                    out.begin_array()?;
                    out.null_value()?;
                    out.end_array()
                }
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Union { members } => {
                for member in members {
                    if member.accepts(value) {
                        return member.encode(value, model, out);
                    }
                }
                Err(type_mismatch(value))
            }
            _ => out.string_value(&self.literal_text(value, model)?),
        }
    }

    /// The value's canonical text without any JSON quoting, as it appears
    /// inside an instance-identifier predicate literal.
    pub(crate) fn literal_text(&self, value: &Value, model: &SchemaContext) -> CodecResult<String> {
        match self {
            JsonCodec::Int { signed, bits, .. } => {
                if !int_matches(*signed, *bits, value) {
                    return Err(type_mismatch(value));
                }
                Ok(value.to_string())
            }
            JsonCodec::Decimal64 {
                fraction_digits, ..
            } => match value {
                Value::Decimal64(d) if d.fraction_digits == *fraction_digits => Ok(d.to_string()),
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Boolean => match value {
                Value::Boolean(b) => Ok(b.to_string()),
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Empty => Err(encode_error("the empty type has no scalar text")),
            JsonCodec::PlainString => match value {
                Value::String(s) => Ok(s.clone()),
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Binary => match value {
                Value::Binary(bytes) => Ok(base64::encode(bytes)),
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Bits { names } => match value {
                Value::Bits(set) => {
                    for name in set {
                        if !names.iter().any(|(n, _)| n == name) {
                            return Err(encode_error(format!("unknown bit '{}'", name)));
                        }
                    }
                    Ok(set.join(" "))
                }
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Enumeration { names } => match value {
                Value::Enum(name) if names.iter().any(|n| n == name) => Ok(name.clone()),
                Value::Enum(name) => Err(encode_error(format!("unknown enum member '{}'", name))),
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::IdentityRef { base, context } => match value {
                Value::IdentityRef(ident) => {
                    if !model.identity_derived_from(ident, base) {
                        return Err(encode_error(format!(
                            "identity {} is not derived from {}",
                            ident, base
                        )));
                    }
                    identityref_text(ident, context, model)
                }
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::InstanceIdentifier { variant } => match value {
                Value::InstanceIdentifier(path) => iid::encode(path, model, *variant),
                _ => Err(type_mismatch(value)),
            },
            JsonCodec::Union { members } => {
                for member in members {
                    if member.accepts(value) {
                        return member.literal_text(value, model);
                    }
                }
                Err(type_mismatch(value))
            }
        }
    }

    /// True if the value's category belongs to this codec's type; used to
    /// route a union value to its member codec.
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (JsonCodec::Int { signed, bits, .. }, _) => int_matches(*signed, *bits, value),
            (JsonCodec::Decimal64 { fraction_digits, .. }, Value::Decimal64(d)) => {
                d.fraction_digits == *fraction_digits
            }
            (JsonCodec::Boolean, Value::Boolean(_)) => true,
            (JsonCodec::Empty, Value::Empty) => true,
            (JsonCodec::PlainString, Value::String(_)) => true,
            (JsonCodec::Binary, Value::Binary(_)) => true,
            (JsonCodec::Bits { .. }, Value::Bits(_)) => true,
            (JsonCodec::Enumeration { names }, Value::Enum(n)) => names.iter().any(|m| m == n),
            (JsonCodec::IdentityRef { .. }, Value::IdentityRef(_)) => true,
            (JsonCodec::InstanceIdentifier { .. }, Value::InstanceIdentifier(_)) => true,
            (JsonCodec::Union { members }, _) => members.iter().any(|m| m.accepts(value)),
            _ => false,
        }
    }

    /// True if decoding may produce [`Value::Empty`], which uses the
    /// `[null]` array spelling instead of a plain scalar.
    pub(crate) fn has_empty(&self) -> bool {
        match self {
            JsonCodec::Empty => true,
            JsonCodec::Union { members } => members.iter().any(JsonCodec::has_empty),
            _ => false,
        }
    }
}

/// Build the codec for a resolved type. `context` is the module of the leaf,
/// which identityref names resolve against.
pub(crate) fn codec_for_type(ty: &TypeDesc, variant: WireVariant, context: &ModuleId) -> JsonCodec {
    let quoted64 = variant == WireVariant::Rfc7951;
    match ty {
        TypeDesc::Int8 => int_codec(true, 8, false),
        TypeDesc::Int16 => int_codec(true, 16, false),
        TypeDesc::Int32 => int_codec(true, 32, false),
        TypeDesc::Int64 => int_codec(true, 64, quoted64),
        TypeDesc::Uint8 => int_codec(false, 8, false),
        TypeDesc::Uint16 => int_codec(false, 16, false),
        TypeDesc::Uint32 => int_codec(false, 32, false),
        TypeDesc::Uint64 => int_codec(false, 64, quoted64),
        TypeDesc::Decimal64 { fraction_digits } => JsonCodec::Decimal64 {
            fraction_digits: *fraction_digits,
            quoted: quoted64,
        },
        TypeDesc::Boolean => JsonCodec::Boolean,
        TypeDesc::Empty => JsonCodec::Empty,
        TypeDesc::String => JsonCodec::PlainString,
        TypeDesc::Binary => JsonCodec::Binary,
        TypeDesc::Bits { bits } => JsonCodec::Bits {
            names: bits.clone(),
        },
        TypeDesc::Enumeration { names } => JsonCodec::Enumeration {
            names: names.clone(),
        },
        TypeDesc::IdentityRef { base } => JsonCodec::IdentityRef {
            base: base.clone(),
            context: context.clone(),
        },
        TypeDesc::InstanceIdentifier => JsonCodec::InstanceIdentifier { variant },
        TypeDesc::Union { members } => JsonCodec::Union {
            members: members
                .iter()
                .map(|m| codec_for_type(m, variant, context))
                .collect(),
        },
        TypeDesc::Derived(inner) => codec_for_type(inner, variant, context),
    }
}

// Identityref codecs resolve against the module of their leaf, so the same
// TypeDesc can yield different codecs at different schema positions.
fn context_sensitive(ty: &TypeDesc) -> bool {
    match ty {
        TypeDesc::IdentityRef { .. } => true,
        TypeDesc::Union { members } => members.iter().any(context_sensitive),
        TypeDesc::Derived(inner) => context_sensitive(inner),
        _ => false,
    }
}

/// Builds and caches scalar codecs for one model and wire variant.
///
/// Shared by reference between any number of parsers and serializers; the
/// cache is internally synchronized.
#[derive(Debug)]
pub struct JsonCodecFactory<'a> {
    model: &'a SchemaContext,
    variant: WireVariant,
    cache: Mutex<HashMap<TypeDesc, JsonCodec>>,
}

impl<'a> JsonCodecFactory<'a> {
    /// Create a factory for the given model and spelling convention.
    pub fn new(model: &'a SchemaContext, variant: WireVariant) -> JsonCodecFactory<'a> {
        JsonCodecFactory {
            model,
            variant,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The model this factory resolves names against.
    pub fn model(&self) -> &'a SchemaContext {
        self.model
    }

    /// The configured spelling convention.
    pub fn variant(&self) -> WireVariant {
        self.variant
    }

    /// The codec for a leaf of type `ty` declared in module `context`.
    pub fn codec_for(&self, ty: &TypeDesc, context: &ModuleId) -> JsonCodec {
        if context_sensitive(ty) {
            return codec_for_type(ty, self.variant, context);
        }
        let mut cache = self.cache.lock().expect("codec cache poisoned");
        cache
            .entry(ty.clone())
            .or_insert_with(|| codec_for_type(ty, self.variant, context))
            .clone()
    }
}

fn int_codec(signed: bool, bits: u8, quoted: bool) -> JsonCodec {
    JsonCodec::Int {
        signed,
        bits,
        quoted,
    }
}

fn numeric_text(scalar: &Scalar) -> CodecResult<&str> {
    match scalar {
        Scalar::Number(t) | Scalar::String(t) => Ok(t),
        other => Err(invalid_value(format!(
            "expected a number, found '{}'",
            other.text()
        ))),
    }
}

fn int_value(signed: bool, bits: u8, n: i128) -> CodecResult<Value> {
    let value = match (signed, bits) {
        (true, 8) => i8::try_from(n).ok().map(Value::Int8),
        (true, 16) => i16::try_from(n).ok().map(Value::Int16),
        (true, 32) => i32::try_from(n).ok().map(Value::Int32),
        (true, 64) => i64::try_from(n).ok().map(Value::Int64),
        (false, 8) => u8::try_from(n).ok().map(Value::Uint8),
        (false, 16) => u16::try_from(n).ok().map(Value::Uint16),
        (false, 32) => u32::try_from(n).ok().map(Value::Uint32),
        (false, 64) => u64::try_from(n).ok().map(Value::Uint64),
        _ => None,
    };
    value.ok_or_else(|| {
        invalid_value(format!(
            "{} is out of range for {}int{}",
            n,
            if signed { "" } else { "u" },
            bits
        ))
    })
}

fn int_matches(signed: bool, bits: u8, value: &Value) -> bool {
    matches!(
        (signed, bits, value),
        (true, 8, Value::Int8(_))
            | (true, 16, Value::Int16(_))
            | (true, 32, Value::Int32(_))
            | (true, 64, Value::Int64(_))
            | (false, 8, Value::Uint8(_))
            | (false, 16, Value::Uint16(_))
            | (false, 32, Value::Uint32(_))
            | (false, 64, Value::Uint64(_))
    )
}

fn parse_decimal(text: &str, fraction_digits: u8) -> CodecResult<Decimal64> {
    let bad = || invalid_value(format!("'{}' is not a valid decimal64", text));
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(bad());
    }
    let digit = |c: char| c.is_ascii_digit();
    if !int_part.chars().all(digit) || !frac_part.chars().all(digit) {
        return Err(bad());
    }
    if frac_part.len() > usize::from(fraction_digits) {
        return Err(invalid_value(format!(
            "'{}' has more than {} fraction digits",
            text, fraction_digits
        )));
    }

    let range = || invalid_value(format!("'{}' is out of range for decimal64", text));
    let mut unscaled: i128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        unscaled = unscaled
            .checked_mul(10)
            .and_then(|u| u.checked_add(i128::from(c as u8 - b'0')))
            .ok_or_else(range)?;
    }
    for _ in frac_part.len()..usize::from(fraction_digits) {
        unscaled = unscaled.checked_mul(10).ok_or_else(range)?;
    }
    if negative {
        unscaled = -unscaled;
    }
    i64::try_from(unscaled)
        .map(|u| Decimal64::new(u, fraction_digits))
        .map_err(|_| range())
}

fn decode_bits(text: &str, names: &[(String, u32)]) -> CodecResult<Value> {
    let mut present: Vec<bool> = vec![false; names.len()];
    for word in text.split_whitespace() {
        let index = names
            .iter()
            .position(|(n, _)| n == word)
            .ok_or_else(|| invalid_value(format!("unknown bit '{}'", word)))?;
        if present[index] {
            return Err(invalid_value(format!("bit '{}' listed twice", word)));
        }
        present[index] = true;
    }
    // Canonical order is declaration order, whatever the input order was.
    let set = names
        .iter()
        .zip(&present)
        .filter(|(_, p)| **p)
        .map(|((n, _), _)| n.clone())
        .collect();
    Ok(Value::Bits(set))
}

fn decode_identityref(
    text: &str,
    base: &QName,
    context: &ModuleId,
    model: &SchemaContext,
) -> CodecResult<Value> {
    let (module, name) = match text.split_once(':') {
        Some((prefix, name)) => {
            let module = model.find_module_by_name(prefix).ok_or_else(|| {
                invalid_value(format!("identity '{}' references unknown module", text))
            })?;
            (module, name)
        }
        None => {
            let module = model.find_module(context).ok_or_else(|| {
                invalid_value(format!("identity '{}' has no resolvable module", text))
            })?;
            (module, text)
        }
    };
    let qname = QName::of_module(module.id.clone(), name);
    if model.find_identity(&qname).is_none() {
        return Err(invalid_value(format!("unknown identity '{}'", text)));
    }
    if !model.identity_derived_from(&qname, base) {
        return Err(invalid_value(format!(
            "identity '{}' is not derived from {}",
            text, base
        )));
    }
    Ok(Value::IdentityRef(qname))
}

// Prefix with the owning module's name when it differs from the leaf's
// module.
fn identityref_text(
    ident: &QName,
    context: &ModuleId,
    model: &SchemaContext,
) -> CodecResult<String> {
    let owner = model
        .module_name_of(ident)
        .ok_or_else(|| encode_error(format!("no module for identity {}", ident)))?;
    let same = model
        .find_module(context)
        .map(|m| m.name == owner)
        .unwrap_or(false);
    if same {
        Ok(ident.local_name.clone())
    } else {
        Ok(format!("{}:{}", owner, ident.local_name))
    }
}

fn type_mismatch(value: &Value) -> crate::util::CodecError {
    encode_error(format!("value '{}' does not match the leaf's type", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Identity, Module};

    fn decode(codec: &JsonCodec, scalar: Scalar) -> CodecResult<Value> {
        let model = SchemaContext::new(Vec::new());
        codec.decode(&scalar, &model)
    }

    fn encode(codec: &JsonCodec, value: &Value) -> CodecResult<String> {
        let model = SchemaContext::new(Vec::new());
        let mut w = crate::token::JsonWriter::new();
        codec.encode(value, &model, &mut w)?;
        Ok(w.into_string())
    }

    #[test]
    fn int_ranges_enforced() {
        let codec = int_codec(false, 8, false);
        assert_eq!(
            decode(&codec, Scalar::Number("255".into())).unwrap(),
            Value::Uint8(255)
        );
        decode(&codec, Scalar::Number("256".into())).unwrap_err();
        decode(&codec, Scalar::Number("-1".into())).unwrap_err();
    }

    #[test]
    fn wide_ints_accept_both_spellings_on_decode() {
        let codec = codec_for_type(&TypeDesc::Uint64, WireVariant::Rfc7951, &ModuleId::new("x"));
        let expected = Value::Uint64(u64::MAX);
        assert_eq!(
            decode(&codec, Scalar::String(u64::MAX.to_string())).unwrap(),
            expected
        );
        assert_eq!(
            decode(&codec, Scalar::Number(u64::MAX.to_string())).unwrap(),
            expected
        );
    }

    #[test]
    fn wide_int_spelling_follows_variant_on_encode() {
        let ctx = ModuleId::new("x");
        let current = codec_for_type(&TypeDesc::Int64, WireVariant::Rfc7951, &ctx);
        let draft = codec_for_type(&TypeDesc::Int64, WireVariant::Draft, &ctx);
        assert_eq!(encode(&current, &Value::Int64(-9)).unwrap(), "\"-9\"");
        assert_eq!(encode(&draft, &Value::Int64(-9)).unwrap(), "-9");
    }

    #[test]
    fn decimal64_scale_and_range() {
        let codec = JsonCodec::Decimal64 {
            fraction_digits: 2,
            quoted: false,
        };
        assert_eq!(
            decode(&codec, Scalar::Number("12.5".into())).unwrap(),
            Value::Decimal64(Decimal64::new(1250, 2))
        );
        assert_eq!(
            decode(&codec, Scalar::Number("-3".into())).unwrap(),
            Value::Decimal64(Decimal64::new(-300, 2))
        );
        // Third fraction digit exceeds the declared scale.
        decode(&codec, Scalar::Number("1.005".into())).unwrap_err();
        decode(&codec, Scalar::String("abc".into())).unwrap_err();
    }

    #[test]
    fn bits_normalize_to_declaration_order() {
        let codec = JsonCodec::Bits {
            names: vec![("a".into(), 0), ("b".into(), 1), ("c".into(), 2)],
        };
        assert_eq!(
            decode(&codec, Scalar::String("c a".into())).unwrap(),
            Value::Bits(vec!["a".into(), "c".into()])
        );
        decode(&codec, Scalar::String("a nope".into())).unwrap_err();
        decode(&codec, Scalar::String("a a".into())).unwrap_err();
    }

    #[test]
    fn union_decodes_first_matching_member() {
        let ctx = ModuleId::new("x");
        let ty = TypeDesc::Union {
            members: vec![TypeDesc::Uint32, TypeDesc::String],
        };
        let codec = codec_for_type(&ty, WireVariant::Rfc7951, &ctx);
        assert_eq!(
            decode(&codec, Scalar::Number("7".into())).unwrap(),
            Value::Uint32(7)
        );
        assert_eq!(
            decode(&codec, Scalar::String("up".into())).unwrap(),
            Value::String("up".into())
        );
    }

    #[test]
    fn identityref_resolves_prefixed_and_bare_names() {
        let ns_a = "urn:example:a";
        let ns_b = "urn:example:b";
        let base = QName::new(ns_a, "crypto-alg");
        let derived = QName::new(ns_b, "aes");
        let mut mod_a = Module::new("a", ModuleId::new(ns_a), Vec::new());
        mod_a.identities.push(Identity {
            qname: base.clone(),
            bases: Vec::new(),
        });
        let mut mod_b = Module::new("b", ModuleId::new(ns_b), Vec::new());
        mod_b.identities.push(Identity {
            qname: derived.clone(),
            bases: vec![base.clone()],
        });
        let model = SchemaContext::new(vec![mod_a, mod_b]);

        let codec = JsonCodec::IdentityRef {
            base: base.clone(),
            context: ModuleId::new(ns_a),
        };
        assert_eq!(
            codec.decode(&Scalar::String("b:aes".into()), &model).unwrap(),
            Value::IdentityRef(derived.clone())
        );
        assert_eq!(
            codec
                .decode(&Scalar::String("crypto-alg".into()), &model)
                .unwrap(),
            Value::IdentityRef(base.clone())
        );
        codec
            .decode(&Scalar::String("nope".into()), &model)
            .unwrap_err();

        // Cross-module values are prefixed, same-module values are not.
        let mut w = crate::token::JsonWriter::new();
        codec
            .encode(&Value::IdentityRef(derived), &model, &mut w)
            .unwrap();
        assert_eq!(w.as_str(), "\"b:aes\"");
    }

    #[test]
    fn empty_spells_null_in_an_array() {
        let codec = JsonCodec::Empty;
        assert_eq!(decode(&codec, Scalar::Null).unwrap(), Value::Empty);
        assert_eq!(encode(&codec, &Value::Empty).unwrap(), "[null]");
    }

    #[test]
    fn factory_caches_context_free_codecs() {
        let model = SchemaContext::new(Vec::new());
        let factory = JsonCodecFactory::new(&model, WireVariant::Rfc7951);
        let ctx = ModuleId::new("x");
        let a = factory.codec_for(&TypeDesc::Uint32, &ctx);
        let b = factory.codec_for(&TypeDesc::Uint32, &ctx);
        assert_eq!(a, b);
        assert_eq!(factory.cache.lock().unwrap().len(), 1);
    }
}
