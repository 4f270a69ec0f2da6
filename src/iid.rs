//! Instance-identifier paths: the XPath-subset grammar used by the
//! `instance-identifier` type.
//!
//! Decoding is two-phase. A nom grammar first cuts the text into raw steps
//! and predicate literals without consulting the model; the raw path is then
//! resolved step by step against the schema tree, predicate literals are
//! decoded with the codec of the leaf they address, and every name becomes a
//! full [`QName`]. Encoding renders the canonical text: a step carries a
//! module-name prefix only when its module differs from the previous step's,
//! and predicate values are always quoted.

use crate::codec::{codec_for_type, WireVariant};
use crate::qname::QName;
use crate::schema::{find_data_child, Module, NodeKind, SchemaContext, SchemaNode};
use crate::token::Scalar;
use crate::util::{encode_error, invalid_value, CodecResult};
use crate::value::Value;
use nom::branch::alt;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::{char, multispace0};
use nom::combinator::{all_consuming, map, opt, recognize};
use nom::multi::{many0, many1};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;
use std::fmt;

/// One step of a resolved instance-identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct PathStep {
    /// The data node this step addresses.
    pub qname: QName,
    /// Key or value predicates, if any.
    pub predicates: Vec<Predicate>,
}

/// A predicate attached to a path step.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `[key='value']` on a list step.
    Key {
        /// The key leaf.
        name: QName,
        /// The decoded key value.
        value: Value,
    },
    /// `[.='value']` on a leaf-list step.
    Value(Value),
}

/// A resolved path to one data node instance.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceIdentifier {
    /// Steps from a top-level node down to the target.
    pub steps: Vec<PathStep>,
}

impl fmt::Display for InstanceIdentifier {
    /// A diagnostic rendering qualified by namespace. The wire form uses
    /// module names instead and needs a model; see the codec's encode path.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut last_ns: Option<&str> = None;
        for step in &self.steps {
            write!(f, "/")?;
            let ns = step.qname.module.namespace.as_str();
            if last_ns != Some(ns) {
                write!(f, "{}:", ns)?;
            }
            write!(f, "{}", step.qname.local_name)?;
            for pred in &step.predicates {
                match pred {
                    Predicate::Key { name, value } => {
                        write!(f, "[{}='{}']", name.local_name, value)?
                    }
                    Predicate::Value(value) => write!(f, "[.='{}']", value)?,
                }
            }
            last_ns = Some(ns);
        }
        Ok(())
    }
}

// Raw grammar output, names still unresolved.

#[derive(Debug, PartialEq)]
struct RawLiteral {
    text: String,
    quoted: bool,
}

impl RawLiteral {
    fn to_scalar(&self) -> Scalar {
        if self.quoted {
            Scalar::String(self.text.clone())
        } else {
            Scalar::Number(self.text.clone())
        }
    }
}

#[derive(Debug, PartialEq)]
enum RawTarget {
    Dot,
    Name {
        module: Option<String>,
        name: String,
    },
}

#[derive(Debug, PartialEq)]
struct RawPredicate {
    target: RawTarget,
    literal: RawLiteral,
}

#[derive(Debug, PartialEq)]
struct RawStep {
    module: Option<String>,
    name: String,
    predicates: Vec<RawPredicate>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')),
    ))(input)
}

fn qualified(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    pair(opt(terminated(identifier, char(':'))), identifier)(input)
}

fn literal(input: &str) -> IResult<&str, RawLiteral> {
    alt((
        map(
            alt((
                delimited(char('\''), take_while(|c| c != '\''), char('\'')),
                delimited(char('"'), take_while(|c| c != '"'), char('"')),
            )),
            |s: &str| RawLiteral {
                text: s.to_string(),
                quoted: true,
            },
        ),
        map(
            take_while1(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')),
            |s: &str| RawLiteral {
                text: s.to_string(),
                quoted: false,
            },
        ),
    ))(input)
}

fn predicate_target(input: &str) -> IResult<&str, RawTarget> {
    alt((
        map(char('.'), |_| RawTarget::Dot),
        map(qualified, |(module, name)| RawTarget::Name {
            module: module.map(str::to_string),
            name: name.to_string(),
        }),
    ))(input)
}

fn predicate(input: &str) -> IResult<&str, RawPredicate> {
    map(
        delimited(
            pair(char('['), multispace0),
            separated_pair(
                predicate_target,
                tuple((multispace0, char('='), multispace0)),
                literal,
            ),
            pair(multispace0, char(']')),
        ),
        |(target, literal)| RawPredicate { target, literal },
    )(input)
}

fn step(input: &str) -> IResult<&str, RawStep> {
    map(
        preceded(char('/'), pair(qualified, many0(predicate))),
        |((module, name), predicates)| RawStep {
            module: module.map(str::to_string),
            name: name.to_string(),
            predicates,
        },
    )(input)
}

fn raw_path(input: &str) -> IResult<&str, Vec<RawStep>> {
    all_consuming(many1(step))(input)
}

/// Parse and resolve an instance-identifier against the model.
pub(crate) fn parse(
    text: &str,
    model: &SchemaContext,
    variant: WireVariant,
) -> CodecResult<InstanceIdentifier> {
    let (_, raw) = raw_path(text)
        .map_err(|_| invalid_value(format!("malformed instance-identifier '{}'", text)))?;

    let mut steps = Vec::with_capacity(raw.len());
    let mut scope: Option<&Module> = None;
    let mut parent: Option<&SchemaNode> = None;
    for raw_step in &raw {
        let module = match &raw_step.module {
            Some(name) => model.find_module_by_name(name).ok_or_else(|| {
                invalid_value(format!("unknown module '{}' in '{}'", name, text))
            })?,
            // An unprefixed step inherits the previous step's module.
            None => scope.ok_or_else(|| {
                invalid_value(format!(
                    "first step of '{}' must carry a module name",
                    text
                ))
            })?,
        };
        let ns = module.id.namespace.as_str();
        let chain = match parent {
            None => find_data_child(&module.children, ns, &raw_step.name),
            Some(node) if node.kind.is_composite() => {
                find_data_child(&node.children, ns, &raw_step.name)
            }
            Some(node) => {
                return Err(invalid_value(format!(
                    "'{}' descends below {} node {}",
                    text, node.kind, node.qname
                )))
            }
        }
        .ok_or_else(|| {
            invalid_value(format!(
                "step '{}' of '{}' does not address a schema node",
                raw_step.name, text
            ))
        })?;
        let target = *chain.last().expect("non-empty chain");

        let predicates = resolve_predicates(raw_step, target, model, variant, text)?;
        steps.push(PathStep {
            qname: target.qname.clone(),
            predicates,
        });
        scope = Some(module);
        parent = Some(target);
    }
    Ok(InstanceIdentifier { steps })
}

fn resolve_predicates(
    raw_step: &RawStep,
    target: &SchemaNode,
    model: &SchemaContext,
    variant: WireVariant,
    text: &str,
) -> CodecResult<Vec<Predicate>> {
    if raw_step.predicates.is_empty() {
        return Ok(Vec::new());
    }
    match target.kind {
        NodeKind::List => {
            let mut predicates = Vec::with_capacity(raw_step.predicates.len());
            for raw_pred in &raw_step.predicates {
                let (key_ns, key_name) = match &raw_pred.target {
                    RawTarget::Dot => {
                        return Err(invalid_value(format!(
                            "'.' predicate on list step '{}' in '{}'",
                            raw_step.name, text
                        )))
                    }
                    RawTarget::Name { module, name } => {
                        let ns = match module {
                            Some(prefix) => model
                                .find_module_by_name(prefix)
                                .map(|m| m.id.namespace.as_str())
                                .ok_or_else(|| {
                                    invalid_value(format!(
                                        "unknown module '{}' in '{}'",
                                        prefix, text
                                    ))
                                })?,
                            None => target.qname.module.namespace.as_str(),
                        };
                        (ns, name.as_str())
                    }
                };
                let leaf_chain =
                    find_data_child(&target.children, key_ns, key_name).ok_or_else(|| {
                        invalid_value(format!(
                            "predicate '{}' of '{}' is not a child of list {}",
                            key_name, text, target.qname
                        ))
                    })?;
                let leaf = *leaf_chain.last().expect("non-empty chain");
                if !target.keys.contains(&leaf.qname) {
                    return Err(invalid_value(format!(
                        "predicate '{}' of '{}' names a non-key leaf",
                        key_name, text
                    )));
                }
                let value = decode_predicate_value(leaf, &raw_pred.literal, model, variant)?;
                predicates.push(Predicate::Key {
                    name: leaf.qname.clone(),
                    value,
                });
            }
            // Canonical predicate order is the declared key order.
            let mut ordered = Vec::with_capacity(target.keys.len());
            for key in &target.keys {
                let found = predicates
                    .iter()
                    .find(|p| matches!(p, Predicate::Key { name, .. } if name == key));
                match found {
                    Some(pred) => ordered.push(pred.clone()),
                    None => {
                        return Err(invalid_value(format!(
                            "'{}' is missing a predicate for key {} of list {}",
                            text, key, target.qname
                        )))
                    }
                }
            }
            Ok(ordered)
        }
        NodeKind::LeafList => match &raw_step.predicates[..] {
            [raw_pred] if raw_pred.target == RawTarget::Dot => {
                let value = decode_predicate_value(target, &raw_pred.literal, model, variant)?;
                Ok(vec![Predicate::Value(value)])
            }
            _ => Err(invalid_value(format!(
                "leaf-list step '{}' in '{}' takes exactly one '.' predicate",
                raw_step.name, text
            ))),
        },
        _ => Err(invalid_value(format!(
            "predicates on {} step '{}' in '{}'",
            target.kind, raw_step.name, text
        ))),
    }
}

fn decode_predicate_value(
    leaf: &SchemaNode,
    literal: &RawLiteral,
    model: &SchemaContext,
    variant: WireVariant,
) -> CodecResult<Value> {
    let ty = leaf.type_desc.as_ref().ok_or_else(|| {
        invalid_value(format!("predicate target {} has no type", leaf.qname))
    })?;
    let codec = codec_for_type(ty, variant, &leaf.qname.module);
    codec.decode(&literal.to_scalar(), model)
}

/// Render the canonical wire text of a resolved path. Each step is resolved
/// against the model, so predicate values come out through the codec of the
/// leaf they address, in the same spelling the parser accepts back.
pub(crate) fn encode(
    path: &InstanceIdentifier,
    model: &SchemaContext,
    variant: WireVariant,
) -> CodecResult<String> {
    let mut out = String::new();
    let mut last_prefix: Option<&str> = None;
    let mut parent: Option<&SchemaNode> = None;
    for step in &path.steps {
        let prefix = model
            .module_name_of(&step.qname)
            .ok_or_else(|| encode_error(format!("no module for {}", step.qname)))?;
        let ns = step.qname.module.namespace.as_str();
        let children = match parent {
            None => {
                let module = model
                    .module_of(&step.qname)
                    .ok_or_else(|| encode_error(format!("no module for {}", step.qname)))?;
                &module.children
            }
            Some(node) => &node.children,
        };
        let target = find_data_child(children, ns, &step.qname.local_name)
            .and_then(|chain| chain.last().copied())
            .ok_or_else(|| {
                encode_error(format!("{} does not address a schema node", step.qname))
            })?;
        out.push('/');
        if last_prefix != Some(prefix) {
            out.push_str(prefix);
            out.push(':');
        }
        out.push_str(&step.qname.local_name);
        for pred in &step.predicates {
            match pred {
                Predicate::Key { name, value } => {
                    let key_prefix = model
                        .module_name_of(name)
                        .ok_or_else(|| encode_error(format!("no module for key {}", name)))?;
                    let leaf = find_data_child(
                        &target.children,
                        name.module.namespace.as_str(),
                        &name.local_name,
                    )
                    .and_then(|chain| chain.last().copied())
                    .ok_or_else(|| {
                        encode_error(format!("{} is not a child of list {}", name, target.qname))
                    })?;
                    out.push('[');
                    if key_prefix != prefix {
                        out.push_str(key_prefix);
                        out.push(':');
                    }
                    out.push_str(&name.local_name);
                    out.push('=');
                    push_quoted(&mut out, &predicate_text(leaf, value, model, variant)?)?;
                    out.push(']');
                }
                Predicate::Value(value) => {
                    out.push_str("[.=");
                    push_quoted(&mut out, &predicate_text(target, value, model, variant)?)?;
                    out.push(']');
                }
            }
        }
        last_prefix = Some(prefix);
        parent = Some(target);
    }
    Ok(out)
}

fn predicate_text(
    leaf: &SchemaNode,
    value: &Value,
    model: &SchemaContext,
    variant: WireVariant,
) -> CodecResult<String> {
    let ty = leaf
        .type_desc
        .as_ref()
        .ok_or_else(|| encode_error(format!("predicate target {} has no type", leaf.qname)))?;
    codec_for_type(ty, variant, &leaf.qname.module).literal_text(value, model)
}

// XPath literals have no escape mechanism; pick whichever quote the value
// does not contain.
fn push_quoted(out: &mut String, text: &str) -> CodecResult<()> {
    let quote = if text.contains('\'') {
        if text.contains('"') {
            return Err(encode_error(format!(
                "predicate value '{}' contains both quote characters",
                text
            )));
        }
        '"'
    } else {
        '\''
    };
    out.push(quote);
    out.push_str(text);
    out.push(quote);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qname::ModuleId;
    use crate::schema::TypeDesc;

    #[test]
    fn raw_grammar_cuts_steps_and_predicates() {
        let (_, raw) = raw_path("/net:hop[net:id='7'][flags = \"a b\"]/mtu").unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].module.as_deref(), Some("net"));
        assert_eq!(raw[0].name, "hop");
        assert_eq!(raw[0].predicates.len(), 2);
        assert_eq!(
            raw[0].predicates[1].literal,
            RawLiteral {
                text: "a b".into(),
                quoted: true
            }
        );
        assert_eq!(raw[1].module, None);
        assert_eq!(raw[1].name, "mtu");
    }

    #[test]
    fn raw_grammar_rejects_garbage() {
        raw_path("").unwrap_err();
        raw_path("hop").unwrap_err();
        raw_path("/net:hop[id=']").unwrap_err();
        raw_path("/net:hop trailing").unwrap_err();
    }

    fn model() -> SchemaContext {
        let ns = "urn:example:net";
        let hop = SchemaNode::list(
            QName::new(ns, "hop"),
            vec![QName::new(ns, "id")],
            vec![
                SchemaNode::leaf(QName::new(ns, "id"), TypeDesc::Uint32),
                SchemaNode::leaf(QName::new(ns, "mtu"), TypeDesc::Uint16),
            ],
        );
        let tags = SchemaNode::leaf_list(QName::new(ns, "tag"), TypeDesc::String);
        let routing = SchemaNode::container(QName::new(ns, "routing"), vec![hop, tags]);
        SchemaContext::new(vec![Module::new("net", ModuleId::new(ns), vec![routing])])
    }

    #[test]
    fn resolves_list_keys_and_inherited_modules() {
        let model = model();
        let ns = "urn:example:net";
        let path = parse(
            "/net:routing/hop[id='7']/mtu",
            &model,
            WireVariant::Rfc7951,
        )
        .unwrap();
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[1].qname, QName::new(ns, "hop"));
        assert_eq!(
            path.steps[1].predicates,
            vec![Predicate::Key {
                name: QName::new(ns, "id"),
                value: Value::Uint32(7),
            }]
        );

        // Bare numeric literals are accepted on input.
        let bare = parse("/net:routing/hop[id=7]/mtu", &model, WireVariant::Rfc7951).unwrap();
        assert_eq!(bare, path);

        assert_eq!(
            encode(&path, &model, WireVariant::Rfc7951).unwrap(),
            "/net:routing/hop[id='7']/mtu"
        );
    }

    #[test]
    fn leaf_list_takes_a_dot_predicate() {
        let model = model();
        let path = parse(
            "/net:routing/tag[.='backbone']",
            &model,
            WireVariant::Rfc7951,
        )
        .unwrap();
        assert_eq!(
            path.steps[1].predicates,
            vec![Predicate::Value(Value::String("backbone".into()))]
        );
        assert_eq!(
            encode(&path, &model, WireVariant::Rfc7951).unwrap(),
            "/net:routing/tag[.='backbone']"
        );
    }

    #[test]
    fn identityref_keys_encode_as_their_wire_name() {
        use crate::schema::Identity;

        let ns = "urn:example:sec";
        let mut module = Module::new(
            "sec",
            ModuleId::new(ns),
            vec![SchemaNode::list(
                QName::new(ns, "cipher"),
                vec![QName::new(ns, "kind")],
                vec![SchemaNode::leaf(
                    QName::new(ns, "kind"),
                    TypeDesc::IdentityRef {
                        base: QName::new(ns, "alg"),
                    },
                )],
            )],
        );
        module.identities = vec![
            Identity {
                qname: QName::new(ns, "alg"),
                bases: Vec::new(),
            },
            Identity {
                qname: QName::new(ns, "aes"),
                bases: vec![QName::new(ns, "alg")],
            },
        ];
        let model = SchemaContext::new(vec![module]);

        let path = parse("/sec:cipher[kind='aes']", &model, WireVariant::Rfc7951).unwrap();
        assert_eq!(
            path.steps[0].predicates,
            vec![Predicate::Key {
                name: QName::new(ns, "kind"),
                value: Value::IdentityRef(QName::new(ns, "aes")),
            }]
        );

        // The rendered literal is the identityref's wire spelling, which the
        // parser accepts back.
        let text = encode(&path, &model, WireVariant::Rfc7951).unwrap();
        assert_eq!(text, "/sec:cipher[kind='aes']");
        assert_eq!(parse(&text, &model, WireVariant::Rfc7951).unwrap(), path);
    }

    #[test]
    fn incomplete_key_predicates_are_rejected() {
        let model = model();
        parse("/net:routing/hop/mtu", &model, WireVariant::Rfc7951).unwrap();
        parse(
            "/net:routing/hop[mtu='1500']/mtu",
            &model,
            WireVariant::Rfc7951,
        )
        .unwrap_err();
        parse("/nope:routing", &model, WireVariant::Rfc7951).unwrap_err();
        parse("/routing", &model, WireVariant::Rfc7951).unwrap_err();
    }
}
