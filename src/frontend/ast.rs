use serde::de::{DeserializeOwned, Error as _};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::ser::{PrettyFormatter, Serializer as JsonSerializer};
use serde_json::{Map, Value};

use crate::frontend::lexer::Ops;
use crate::stack::guarded;

// One enum for every node kind, laid out like ESTree so the JSON form reads
// as a JavaScript program. Parentheses from the source are not kept, the
// generator re-derives them from operator precedence.
//
// A sum of n numbers is a tree n levels deep, so nothing here may recurse
// on the thread stack alone: serialization and JSON reading go through
// `guarded`, and `Drop` takes the tree apart iteratively.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program {
        body: Vec<Node>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
        optional: bool,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
        optional: bool,
    },
    BinaryExpression {
        operator: Ops,
        left: Box<Node>,
        right: Box<Node>,
    },
    Identifier {
        name: String,
    },
    Literal {
        value: f64,
        raw: String,
    },
    // A node kind read from JSON that is not modelled above, keeping the
    // name it was read under. The parser never builds one.
    Unknown {
        kind: String,
    },
}

impl Node {
    pub fn literal(value: f64, raw: impl Into<String>) -> Self {
        Node::Literal {
            value,
            raw: raw.into(),
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Node::Identifier { name: name.into() }
    }

    pub fn binary(operator: Ops, left: Node, right: Node) -> Self {
        Node::BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Wrap `expr` into a whole program whose only effect is
    /// `console.log(expr)`.
    pub fn print_program(expr: Node) -> Self {
        let callee = Node::MemberExpression {
            object: Box::new(Node::identifier("console")),
            property: Box::new(Node::identifier("log")),
            computed: false,
            optional: false,
        };

        let call = Node::CallExpression {
            callee: Box::new(callee),
            arguments: vec![expr],
            optional: false,
        };

        Node::Program {
            body: vec![Node::ExpressionStatement {
                expression: Box::new(call),
            }],
        }
    }

    /// Name of the node kind, as written in the `type` field of the JSON form.
    pub fn kind(&self) -> &str {
        match self {
            Node::Program { .. } => "Program",
            Node::ExpressionStatement { .. } => "ExpressionStatement",
            Node::CallExpression { .. } => "CallExpression",
            Node::MemberExpression { .. } => "MemberExpression",
            Node::BinaryExpression { .. } => "BinaryExpression",
            Node::Identifier { .. } => "Identifier",
            Node::Literal { .. } => "Literal",
            Node::Unknown { kind } => kind,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Node::Identifier { .. } | Node::Literal { .. } | Node::Unknown { .. }
        )
    }

    /// Pretty JSON with four space indentation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = Vec::new();
        let mut serializer = JsonSerializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;

        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Read a tree back from its JSON form, however deeply it is nested.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();

        let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
        deserializer.end()?;

        Node::from_value(value)
    }

    fn from_value(value: Value) -> serde_json::Result<Self> {
        guarded(|| {
            let Value::Object(mut fields) = value else {
                return Err(serde_json::Error::custom("expected an AST node object"));
            };

            let kind: String = take(&mut fields, "type")?;

            let node = match kind.as_str() {
                "Program" => Node::Program {
                    body: take_nodes(&mut fields, "body")?,
                },
                "ExpressionStatement" => Node::ExpressionStatement {
                    expression: take_node(&mut fields, "expression")?,
                },
                "CallExpression" => Node::CallExpression {
                    callee: take_node(&mut fields, "callee")?,
                    arguments: take_nodes(&mut fields, "arguments")?,
                    optional: take_or_default(&mut fields, "optional")?,
                },
                "MemberExpression" => Node::MemberExpression {
                    object: take_node(&mut fields, "object")?,
                    property: take_node(&mut fields, "property")?,
                    computed: take(&mut fields, "computed")?,
                    optional: take(&mut fields, "optional")?,
                },
                "BinaryExpression" => Node::BinaryExpression {
                    operator: take(&mut fields, "operator")?,
                    left: take_node(&mut fields, "left")?,
                    right: take_node(&mut fields, "right")?,
                },
                "Identifier" => Node::Identifier {
                    name: take(&mut fields, "name")?,
                },
                // NaN went out as `null`
                "Literal" => Node::Literal {
                    value: take::<Option<f64>>(&mut fields, "value")?.unwrap_or(f64::NAN),
                    raw: take(&mut fields, "raw")?,
                },
                _ => Node::Unknown { kind: kind.clone() },
            };

            Ok(node)
        })
    }

    // Move every non-leaf child out into `pending`, leaving leaves behind.
    fn take_children(&mut self, pending: &mut Vec<Node>) {
        let mut detach = |child: &mut Box<Node>| {
            if !child.is_leaf() {
                pending.push(std::mem::replace(&mut **child, Node::Unknown { kind: String::new() }));
            }
        };

        match self {
            Node::Program { body } => pending.extend(body.drain(..).filter(|node| !node.is_leaf())),
            Node::ExpressionStatement { expression } => detach(expression),
            Node::CallExpression {
                callee, arguments, ..
            } => {
                detach(callee);
                pending.extend(arguments.drain(..).filter(|node| !node.is_leaf()));
            }
            Node::MemberExpression {
                object, property, ..
            } => {
                detach(object);
                detach(property);
            }
            Node::BinaryExpression { left, right, .. } => {
                detach(left);
                detach(right);
            }
            Node::Identifier { .. } | Node::Literal { .. } | Node::Unknown { .. } => {}
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);

        // Each popped node only has leaves left by the time it is dropped
        while let Some(mut node) = pending.pop() {
            node.take_children(&mut pending);
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        guarded(|| {
            let mut map = serializer.serialize_map(None)?;
            map.serialize_entry("type", self.kind())?;

            match self {
                Node::Program { body } => map.serialize_entry("body", body)?,
                Node::ExpressionStatement { expression } => map.serialize_entry("expression", expression)?,
                Node::CallExpression {
                    callee,
                    arguments,
                    optional,
                } => {
                    map.serialize_entry("callee", callee)?;
                    map.serialize_entry("arguments", arguments)?;
                    map.serialize_entry("optional", optional)?;
                }
                Node::MemberExpression {
                    object,
                    property,
                    computed,
                    optional,
                } => {
                    map.serialize_entry("object", object)?;
                    map.serialize_entry("property", property)?;
                    map.serialize_entry("computed", computed)?;
                    map.serialize_entry("optional", optional)?;
                }
                Node::BinaryExpression {
                    operator,
                    left,
                    right,
                } => {
                    map.serialize_entry("operator", operator)?;
                    map.serialize_entry("left", left)?;
                    map.serialize_entry("right", right)?;
                }
                Node::Identifier { name } => map.serialize_entry("name", name)?,
                // serde_json writes non-finite floats as `null`
                Node::Literal { value, raw } => {
                    map.serialize_entry("value", value)?;
                    map.serialize_entry("raw", raw)?;
                }
                Node::Unknown { .. } => {}
            }

            map.end()
        })
    }
}

type Fields = Map<String, Value>;

fn take<T: DeserializeOwned>(fields: &mut Fields, name: &'static str) -> serde_json::Result<T> {
    let value = fields
        .remove(name)
        .ok_or_else(|| serde_json::Error::missing_field(name))?;

    serde_json::from_value(value)
}

fn take_or_default<T: DeserializeOwned + Default>(fields: &mut Fields, name: &'static str) -> serde_json::Result<T> {
    match fields.remove(name) {
        Some(value) => serde_json::from_value(value),
        None => Ok(T::default()),
    }
}

fn take_node(fields: &mut Fields, name: &'static str) -> serde_json::Result<Box<Node>> {
    let value = fields
        .remove(name)
        .ok_or_else(|| serde_json::Error::missing_field(name))?;

    Node::from_value(value).map(Box::new)
}

fn take_nodes(fields: &mut Fields, name: &'static str) -> serde_json::Result<Vec<Node>> {
    match fields.remove(name) {
        Some(Value::Array(items)) => items.into_iter().map(Node::from_value).collect(),
        Some(_) => Err(serde_json::Error::custom(format!("field `{name}` must be an array of AST nodes"))),
        None => Err(serde_json::Error::missing_field(name)),
    }
}
