//! Minimal element tree over quick-xml events

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// Parse a complete document with exactly one root element
    pub fn parse(input: &str) -> Result<Element, String> {
        let mut reader = Reader::from_str(input);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    if root.is_some() && stack.is_empty() {
                        return Err("junk after document element".to_string());
                    }
                    stack.push(element_from(&start)?);
                }
                Ok(Event::Empty(start)) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| "closing tag without opening tag".to_string())?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(text)) => {
                    let text = text.unescape().map_err(|e| e.to_string())?;
                    match stack.last_mut() {
                        Some(top) => top.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err("text outside of the document element".to_string()),
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    ))
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(format!("unclosed element <{}>", open.name));
        }
        root.ok_or_else(|| "no element found".to_string())
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, or an empty string when absent
    pub fn attr_or_empty(&self, key: &str) -> String {
        self.attr(key).unwrap_or_default().to_string()
    }

    /// All descendants matching a slash-separated path of child names
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current: Vec<&Element> = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.children.iter().filter(|c| c.name == segment))
                .collect();
        }
        current
    }

    /// First element matching the path
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, String> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err("junk after document element".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_paths() {
        let root = Element::parse(
            r#"<?xml version="1.0"?>
<!DOCTYPE nmaprun>
<nmaprun args="nmap -oX - x">
  <runstats><finished elapsed="1.5"/><hosts up="1"/></runstats>
  <host><ports><port portid="22"/><port portid="80"/></ports></host>
  <host><ports><port portid="443"/></ports></host>
</nmaprun>"#,
        )
        .unwrap();

        assert_eq!(root.name, "nmaprun");
        assert_eq!(root.attr("args"), Some("nmap -oX - x"));
        assert_eq!(root.find("runstats/finished").unwrap().attr("elapsed"), Some("1.5"));
        assert_eq!(root.find_all("host").len(), 2);
        assert_eq!(root.find_all("host/ports/port").len(), 3);
        assert!(root.find("runstats/missing").is_none());
        assert_eq!(root.find("host").unwrap().attr_or_empty("nope"), "");
    }

    #[test]
    fn test_text_and_entities() {
        let root = Element::parse("<a><cpe>cpe:/a:apache:http_server:2.4 &amp; more</cpe></a>").unwrap();
        assert_eq!(root.find("cpe").unwrap().text, "cpe:/a:apache:http_server:2.4 & more");
    }

    #[test]
    fn test_rejects_broken_documents() {
        assert!(Element::parse("").is_err());
        assert!(Element::parse("not xml at all").is_err());
        assert!(Element::parse("<a><b></a>").is_err());
        assert!(Element::parse("<a>").is_err());
        assert!(Element::parse("<a/><b/>").is_err());
    }
}
