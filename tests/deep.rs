use ntest::timeout;
use yangjson::{
    DataNode, JsonCodecFactory, JsonParser, JsonStreamWriter, Module, ModuleId, QName,
    SchemaContext, SchemaNode, TypeDesc, Value, ValueReader, WireVariant,
};

const NS: &str = "urn:example:deep";
const DEPTH: usize = 64;

fn model() -> SchemaContext {
    let mut node = SchemaNode::leaf(QName::new(NS, "bottom"), TypeDesc::Uint32);
    for _ in 0..DEPTH {
        node = SchemaNode::container(QName::new(NS, "level"), vec![node]);
    }
    SchemaContext::new(vec![Module::new("deep", ModuleId::new(NS), vec![node])])
}

#[test]
#[timeout(5000)] // 5 seconds
fn deeply_nested_documents_roundtrip() {
    let model = model();
    let codecs = JsonCodecFactory::new(&model, WireVariant::Rfc7951);
    let parser = JsonParser::new(&codecs);
    let writer = JsonStreamWriter::exclusive(&codecs);

    let mut text = String::from(r#"{"deep:level":"#);
    for _ in 1..DEPTH {
        text.push_str(r#"{"level":"#);
    }
    text.push_str(r#"{"bottom":7}"#);
    for _ in 0..DEPTH {
        text.push('}');
    }

    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    let nodes = parser.parse(&mut ValueReader::new(&doc)).unwrap();

    let mut node = &nodes[0];
    for _ in 1..DEPTH {
        node = match node {
            DataNode::Container { children, .. } => &children[0],
            other => panic!("expected a container, got {:?}", other),
        };
    }
    assert_eq!(
        node.children(),
        &[DataNode::leaf(QName::new(NS, "bottom"), Value::Uint32(7))]
    );

    let rewritten = writer.write_string(&nodes).unwrap();
    assert_eq!(rewritten, text);
}
