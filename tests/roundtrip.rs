use yangjson::{
    JsonCodecFactory, JsonParser, JsonStreamWriter, Module, ModuleId, QName, SchemaContext,
    SchemaNode, TypeDesc, ValueReader, WireVariant,
};

const NET: &str = "urn:example:net";

fn model() -> SchemaContext {
    let hop = SchemaNode::list(
        QName::new(NET, "hop"),
        vec![QName::new(NET, "id")],
        vec![
            SchemaNode::leaf(QName::new(NET, "id"), TypeDesc::Uint32),
            SchemaNode::leaf(
                QName::new(NET, "flags"),
                TypeDesc::Bits {
                    bits: vec![("a".into(), 0), ("b".into(), 1)],
                },
            ),
            SchemaNode::leaf(QName::new(NET, "next"), TypeDesc::InstanceIdentifier),
        ],
    );
    let routing = SchemaNode::container(
        QName::new(NET, "routing"),
        vec![
            hop,
            SchemaNode::leaf_list(QName::new(NET, "tag"), TypeDesc::String),
            SchemaNode::leaf(QName::new(NET, "counter"), TypeDesc::Uint64),
            SchemaNode::leaf(
                QName::new(NET, "delay"),
                TypeDesc::Decimal64 { fraction_digits: 2 },
            ),
            SchemaNode::leaf(QName::new(NET, "note"), TypeDesc::Empty),
        ],
    );
    SchemaContext::new(vec![Module::new("net", ModuleId::new(NET), vec![routing])])
}

// Parse, re-serialize, and compare as JSON values so member order does not
// matter.
fn roundtrip(model: &SchemaContext, variant: WireVariant, text: &str) {
    let codecs = JsonCodecFactory::new(model, variant);
    let parser = JsonParser::new(&codecs);
    let writer = JsonStreamWriter::exclusive(&codecs);

    let doc: serde_json::Value = serde_json::from_str(text).unwrap();
    let nodes = parser.parse(&mut ValueReader::new(&doc)).unwrap();
    let rewritten = writer.write_string(&nodes).unwrap();
    let requoted: serde_json::Value = serde_json::from_str(&rewritten).unwrap();
    assert_eq!(requoted, doc, "rewritten: {}", rewritten);
}

#[test]
fn canonical_documents_roundtrip_in_both_variants() {
    let model = model();
    roundtrip(
        &model,
        WireVariant::Rfc7951,
        r#"{"net:routing": {
            "hop": [
                {"id": 1, "flags": "a b", "next": "/net:routing/hop[id='2']"},
                {"id": 2}
            ],
            "tag": ["x", "y"],
            "counter": "18446744073709551615",
            "delay": "12.5",
            "note": [null]
        }}"#,
    );
    roundtrip(
        &model,
        WireVariant::Draft,
        r#"{"net:routing": {
            "hop": [{"id": 1}],
            "counter": 18446744073709551615,
            "delay": 12.5
        }}"#,
    );
}

#[test]
fn noncanonical_input_comes_back_canonical() {
    let model = model();
    let codecs = JsonCodecFactory::new(&model, WireVariant::Rfc7951);
    let parser = JsonParser::new(&codecs);
    let writer = JsonStreamWriter::exclusive(&codecs);

    // Bits out of order, a bare wide number, and trailing decimal zeros all
    // normalize on the way through.
    let doc: serde_json::Value = serde_json::from_str(
        r#"{"net:routing": {
            "hop": [{"id": 1, "flags": "b a"}],
            "counter": 7,
            "delay": "12.50"
        }}"#,
    )
    .unwrap();
    let nodes = parser.parse(&mut ValueReader::new(&doc)).unwrap();
    let rewritten = writer.write_string(&nodes).unwrap();
    assert!(rewritten.contains(r#""flags":"a b""#), "{}", rewritten);
    assert!(rewritten.contains(r#""counter":"7""#), "{}", rewritten);
    assert!(rewritten.contains(r#""delay":"12.5""#), "{}", rewritten);
}

#[test]
fn references_into_identityref_keyed_lists_roundtrip() {
    use yangjson::Identity;

    let ns = "urn:example:sec";
    let mut module = Module::new(
        "sec",
        ModuleId::new(ns),
        vec![SchemaNode::container(
            QName::new(ns, "crypto"),
            vec![
                SchemaNode::list(
                    QName::new(ns, "cipher"),
                    vec![QName::new(ns, "kind")],
                    vec![SchemaNode::leaf(
                        QName::new(ns, "kind"),
                        TypeDesc::IdentityRef {
                            base: QName::new(ns, "alg"),
                        },
                    )],
                ),
                SchemaNode::leaf(QName::new(ns, "preferred"), TypeDesc::InstanceIdentifier),
            ],
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
    let codecs = JsonCodecFactory::new(&model, WireVariant::Rfc7951);
    let parser = JsonParser::new(&codecs);
    let writer = JsonStreamWriter::exclusive(&codecs);

    let doc: serde_json::Value = serde_json::from_str(
        r#"{"sec:crypto": {
            "cipher": [{"kind": "aes"}],
            "preferred": "/sec:crypto/cipher[kind='aes']"
        }}"#,
    )
    .unwrap();
    let nodes = parser.parse(&mut ValueReader::new(&doc)).unwrap();
    let rewritten = writer.write_string(&nodes).unwrap();
    assert!(
        rewritten.contains(r#""preferred":"/sec:crypto/cipher[kind='aes']""#),
        "{}",
        rewritten
    );

    // The serialized form parses back to the same tree.
    let requoted: serde_json::Value = serde_json::from_str(&rewritten).unwrap();
    let reparsed = parser.parse(&mut ValueReader::new(&requoted)).unwrap();
    assert_eq!(reparsed, nodes);
}

#[test]
fn parsed_entries_roundtrip_through_nested_output() {
    let model = model();
    let codecs = JsonCodecFactory::new(&model, WireVariant::Rfc7951);
    let parser = JsonParser::new(&codecs);
    let path = [QName::new(NET, "routing"), QName::new(NET, "hop")];

    let doc: serde_json::Value =
        serde_json::from_str(r#"{"id": 3, "flags": "b"}"#).unwrap();
    let entry = parser
        .parse_list_entry(&mut ValueReader::new(&doc), &path)
        .unwrap();

    let writer = JsonStreamWriter::nested(&codecs, &path);
    let rewritten = writer.write_string(&[entry]).unwrap();
    let requoted: serde_json::Value = serde_json::from_str(&rewritten).unwrap();
    assert_eq!(requoted, doc);
}
