// XML → JSON converter: attributes become `@name`, repeated tags collapse into arrays.
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

/// Parses an XML document into a JSON value wrapped by the root tag name.
///
/// Elements without children or attributes become plain strings; elements that
/// carry attributes keep their text under `#text`.
///
/// # Example
/// ```
/// use wcag_core::convert::xml::xml_to_json;
/// let value = xml_to_json("<a id=\"1\"><b>x</b><b>y</b></a>")?;
/// assert_eq!(value["a"]["@id"], "1");
/// assert_eq!(value["a"]["b"][1], "y");
/// # Ok::<(), String>(())
/// ```
pub fn xml_to_json(input: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => {
                stack.push(XmlElement::from_tag(&tag)?);
            }
            Ok(Event::Empty(tag)) => {
                let node = XmlElement::from_tag(&tag)?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|err| err.to_string())?;
                    current.text.push_str(unescaped.as_ref());
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(data.into_inner().as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(format!("Invalid XML: {err}")),
            _ => {}
        }
        buf.clear();
    }
    if !stack.is_empty() {
        return Err("Invalid XML: unclosed element".into());
    }
    let root = root.ok_or_else(|| "Invalid XML: no root element".to_string())?;
    let mut wrapper = Map::new();
    wrapper.insert(root.name.clone(), element_to_value(&root));
    Ok(Value::Object(wrapper))
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, node: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    }
}

fn element_to_value(el: &XmlElement) -> Value {
    let mut obj = Map::new();
    for (name, value) in &el.attributes {
        obj.insert(format!("@{name}"), Value::String(value.clone()));
    }
    for child in &el.children {
        let value = element_to_value(child);
        match obj.get_mut(&child.name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                obj.insert(child.name.clone(), value);
            }
        }
    }
    if el.children.is_empty() {
        let text = el.text.trim();
        if !text.is_empty() {
            if obj.is_empty() {
                return Value::String(text.to_string());
            }
            obj.insert("#text".into(), Value::String(text.to_string()));
        }
    }
    if obj.is_empty() {
        Value::String(String::new())
    } else {
        Value::Object(obj)
    }
}

#[derive(Debug, Clone)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_tag(tag: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(tag.name().as_ref()).trim().to_string();
        let mut attributes = Vec::new();
        for attr in tag.attributes() {
            let attr = attr.map_err(|err| format!("Invalid XML: {err}"))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| format!("Invalid XML: {err}"))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }
}
