//! A small XSLT 1.0 applier covering the instruction set notice stylesheets
//! actually use: template matching with built-in rules, `value-of`,
//! `for-each`, `apply-templates`, conditionals, and literal result elements
//! with `{…}` attribute value templates. Anything outside the subset is a
//! loud transform error, never a silent no-op.

use crate::error::{ConvertError, Result};
use crate::xml::{Document, Element, XmlNode};

const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";

pub struct Stylesheet {
    templates: Vec<Template>,
    prefix: String,
}

struct Template {
    pattern: Pattern,
    body: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq)]
enum Pattern {
    Root,
    Any,
    Name(String),
    Text,
}

impl Pattern {
    fn parse(pattern: &str) -> Result<Self> {
        match pattern.trim() {
            "/" => Ok(Self::Root),
            "*" => Ok(Self::Any),
            "text()" => Ok(Self::Text),
            name if !name.is_empty() && !name.contains(['/', '[', '@', '|', ' ']) => {
                Ok(Self::Name(name.to_string()))
            }
            other => Err(ConvertError::Transform(format!(
                "unsupported match pattern \"{other}\""
            ))),
        }
    }
}

/// The node a template body is instantiated against.
#[derive(Clone, Copy)]
enum Context<'a> {
    Element(&'a Element),
    Text(&'a str),
}

impl<'a> Context<'a> {
    fn string_value(&self) -> String {
        match self {
            Context::Element(e) => e.string_value(),
            Context::Text(t) => (*t).to_string(),
        }
    }
}

impl Stylesheet {
    /// Compile a parsed `<xsl:stylesheet>` document into a template list.
    pub fn parse(doc: &Document) -> Result<Self> {
        let root = &doc.root;
        let prefix = xslt_prefix(root);
        match local_name(&root.name) {
            "stylesheet" | "transform" => {}
            other => {
                return Err(ConvertError::Transform(format!(
                    "expected an xsl:stylesheet root, found <{other}>"
                )))
            }
        }

        let mut templates = Vec::new();
        for child in root.child_elements() {
            match instruction_name(child, &prefix) {
                Some("template") => {
                    let pattern = child.attr("match").ok_or_else(|| {
                        ConvertError::Transform("xsl:template without a match attribute".into())
                    })?;
                    templates.push(Template {
                        pattern: Pattern::parse(pattern)?,
                        body: child.children.clone(),
                    });
                }
                // Output shaping is fixed by the serializer below.
                Some("output") => {}
                Some(other) => {
                    return Err(ConvertError::Transform(format!(
                        "unsupported top-level instruction xsl:{other}"
                    )))
                }
                None => {}
            }
        }
        Ok(Self { templates, prefix })
    }

    /// Apply the stylesheet to a source document and serialize the result.
    pub fn apply(&self, doc: &Document) -> Result<String> {
        // A synthetic document node makes "/" and leading child steps uniform.
        let doc_node = Element {
            name: String::new(),
            attributes: Vec::new(),
            children: vec![XmlNode::Element(doc.root.clone())],
        };
        let mut out = String::new();
        match self.templates.iter().find(|t| t.pattern == Pattern::Root) {
            Some(template) => {
                self.instantiate(&template.body, Context::Element(&doc_node), &mut out)?
            }
            None => {
                for child in &doc_node.children {
                    self.apply_to_node(child, &mut out)?;
                }
            }
        }
        Ok(out)
    }

    fn apply_to_node(&self, node: &XmlNode, out: &mut String) -> Result<()> {
        match node {
            XmlNode::Text(t) => self.apply_to_text(t, out),
            XmlNode::Element(e) => self.apply_to_element(e, out),
        }
    }

    fn apply_to_text(&self, text: &str, out: &mut String) -> Result<()> {
        match self.templates.iter().find(|t| t.pattern == Pattern::Text) {
            Some(template) => self.instantiate(&template.body, Context::Text(text), out),
            None => {
                out.push_str(&esc_text(text));
                Ok(())
            }
        }
    }

    fn apply_to_element(&self, elem: &Element, out: &mut String) -> Result<()> {
        match self.template_for(elem) {
            Some(template) => self.instantiate(&template.body, Context::Element(elem), out),
            None => {
                // Built-in rule: recurse into children.
                for child in &elem.children {
                    self.apply_to_node(child, out)?;
                }
                Ok(())
            }
        }
    }

    fn template_for(&self, elem: &Element) -> Option<&Template> {
        self.templates
            .iter()
            .find(|t| matches!(&t.pattern, Pattern::Name(n) if *n == elem.name))
            .or_else(|| self.templates.iter().find(|t| t.pattern == Pattern::Any))
    }

    fn instantiate(&self, body: &[XmlNode], ctx: Context<'_>, out: &mut String) -> Result<()> {
        for node in body {
            match node {
                XmlNode::Text(t) => out.push_str(&esc_text(t)),
                XmlNode::Element(e) => match instruction_name(e, &self.prefix) {
                    Some(instr) => self.run_instruction(instr, e, ctx, out)?,
                    None => self.emit_literal(e, ctx, out)?,
                },
            }
        }
        Ok(())
    }

    fn run_instruction(
        &self,
        instr: &str,
        elem: &Element,
        ctx: Context<'_>,
        out: &mut String,
    ) -> Result<()> {
        match instr {
            "value-of" => {
                let select = required_attr(elem, "select", "xsl:value-of")?;
                out.push_str(&esc_text(&self.eval_string(ctx, select)?));
            }
            "apply-templates" => match elem.attr("select") {
                Some(select) => {
                    for node in self.select_nodes(ctx, select)? {
                        match node {
                            Selected::Element(e) => self.apply_to_element(e, out)?,
                            Selected::Text(t) => self.apply_to_text(t, out)?,
                        }
                    }
                }
                None => {
                    if let Context::Element(e) = ctx {
                        for child in &e.children {
                            self.apply_to_node(child, out)?;
                        }
                    }
                }
            },
            "for-each" => {
                let select = required_attr(elem, "select", "xsl:for-each")?;
                for node in self.select_nodes(ctx, select)? {
                    let ctx = match node {
                        Selected::Element(e) => Context::Element(e),
                        Selected::Text(t) => Context::Text(t),
                    };
                    self.instantiate(&elem.children, ctx, out)?;
                }
            }
            "if" => {
                let test = required_attr(elem, "test", "xsl:if")?;
                if self.eval_test(ctx, test)? {
                    self.instantiate(&elem.children, ctx, out)?;
                }
            }
            "choose" => self.run_choose(elem, ctx, out)?,
            "text" => {
                for child in &elem.children {
                    if let XmlNode::Text(t) = child {
                        out.push_str(&esc_text(t));
                    }
                }
            }
            other => {
                return Err(ConvertError::Transform(format!(
                    "unsupported instruction xsl:{other}"
                )))
            }
        }
        Ok(())
    }

    fn run_choose(&self, elem: &Element, ctx: Context<'_>, out: &mut String) -> Result<()> {
        let mut otherwise: Option<&Element> = None;
        for branch in elem.child_elements() {
            match instruction_name(branch, &self.prefix) {
                Some("when") => {
                    let test = required_attr(branch, "test", "xsl:when")?;
                    if self.eval_test(ctx, test)? {
                        return self.instantiate(&branch.children, ctx, out);
                    }
                }
                Some("otherwise") => otherwise = Some(branch),
                _ => {
                    return Err(ConvertError::Transform(
                        "xsl:choose accepts only xsl:when and xsl:otherwise".into(),
                    ))
                }
            }
        }
        match otherwise {
            Some(branch) => self.instantiate(&branch.children, ctx, out),
            None => Ok(()),
        }
    }

    fn emit_literal(&self, elem: &Element, ctx: Context<'_>, out: &mut String) -> Result<()> {
        out.push('<');
        out.push_str(&elem.name);
        for (key, value) in &elem.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&esc_attr(&self.eval_avt(ctx, value)?));
            out.push('"');
        }
        if is_void(&elem.name) && elem.children.is_empty() {
            out.push_str("/>");
            return Ok(());
        }
        out.push('>');
        self.instantiate(&elem.children, ctx, out)?;
        out.push_str("</");
        out.push_str(&elem.name);
        out.push('>');
        Ok(())
    }

    /// Evaluate an attribute value template: `{expr}` pieces are replaced by
    /// their string values, `{{`/`}}` escape literal braces.
    fn eval_avt(&self, ctx: Context<'_>, value: &str) -> Result<String> {
        if !value.contains(['{', '}']) {
            return Ok(value.to_string());
        }
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        loop {
            let Some(open) = rest.find(['{', '}']) else {
                out.push_str(rest);
                return Ok(out);
            };
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if let Some(stripped) = tail.strip_prefix('{') {
                let close = stripped.find('}').ok_or_else(|| {
                    ConvertError::Transform("unterminated attribute value template".into())
                })?;
                out.push_str(&self.eval_string(ctx, stripped[..close].trim())?);
                rest = &stripped[close + 1..];
            } else {
                return Err(ConvertError::Transform(
                    "unmatched } in attribute value template".into(),
                ));
            }
        }
    }

    /// String value of a select expression: `.`, `@attr`, or a relative
    /// child path with an optional trailing `@attr` or `text()`.
    fn eval_string(&self, ctx: Context<'_>, expr: &str) -> Result<String> {
        if expr == "." {
            return Ok(ctx.string_value());
        }
        if let Some(attr) = expr.strip_prefix('@') {
            return Ok(match ctx {
                Context::Element(e) => e.attr(attr).unwrap_or_default().to_string(),
                Context::Text(_) => String::new(),
            });
        }

        let (elem_path, leaf) = split_leaf(expr);
        let elems = self.select_elements(ctx, elem_path)?;
        let Some(first) = elems.first() else {
            return Ok(String::new());
        };
        Ok(match leaf {
            Leaf::Value => first.string_value(),
            Leaf::Attr(name) => first.attr(name).unwrap_or_default().to_string(),
            Leaf::Text => first
                .children
                .iter()
                .find_map(|c| match c {
                    XmlNode::Text(t) => Some(t.clone()),
                    XmlNode::Element(_) => None,
                })
                .unwrap_or_default(),
        })
    }

    /// Boolean of an `xsl:if`/`xsl:when` test: either a node-set existence
    /// check or a `path = 'literal'` string comparison.
    fn eval_test(&self, ctx: Context<'_>, test: &str) -> Result<bool> {
        if let Some((lhs, rhs)) = test.split_once('=') {
            let rhs = rhs.trim();
            let literal = rhs
                .strip_prefix('\'')
                .and_then(|r| r.strip_suffix('\''))
                .or_else(|| rhs.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
                .ok_or_else(|| {
                    ConvertError::Transform(format!(
                        "unsupported test expression \"{test}\": right side must be a quoted literal"
                    ))
                })?;
            return Ok(self.eval_string(ctx, lhs.trim())? == literal);
        }

        let expr = test.trim();
        if expr == "." {
            return Ok(true);
        }
        if let Some(attr) = expr.strip_prefix('@') {
            return Ok(matches!(ctx, Context::Element(e) if e.attr(attr).is_some()));
        }
        if let (path, Leaf::Attr(attr)) = split_leaf(expr) {
            let elems = self.select_elements(ctx, path)?;
            return Ok(elems.iter().any(|e| e.attr(attr).is_some()));
        }
        Ok(!self.select_nodes(ctx, expr)?.is_empty())
    }

    fn select_elements<'a>(&self, ctx: Context<'a>, path: &str) -> Result<Vec<&'a Element>> {
        let base = match ctx {
            Context::Element(e) => e,
            Context::Text(_) => return Ok(Vec::new()),
        };
        if path.is_empty() || path == "." {
            return Ok(vec![base]);
        }
        check_path(path)?;
        let mut current = vec![base];
        for step in path.split('/') {
            current = current
                .into_iter()
                .flat_map(Element::child_elements)
                .filter(|e| step == "*" || e.name == step)
                .collect();
        }
        Ok(current)
    }

    fn select_nodes<'a>(&self, ctx: Context<'a>, select: &str) -> Result<Vec<Selected<'a>>> {
        let select = select.trim();
        if select == "." {
            return Ok(match ctx {
                Context::Element(e) => vec![Selected::Element(e)],
                Context::Text(t) => vec![Selected::Text(t)],
            });
        }

        let (elem_path, leaf) = split_leaf(select);
        match leaf {
            Leaf::Attr(_) => Err(ConvertError::Transform(format!(
                "cannot apply templates to an attribute: \"{select}\""
            ))),
            Leaf::Text => {
                let elems = self.select_elements(ctx, elem_path)?;
                Ok(elems
                    .into_iter()
                    .flat_map(|e| &e.children)
                    .filter_map(|c| match c {
                        XmlNode::Text(t) => Some(Selected::Text(t)),
                        XmlNode::Element(_) => None,
                    })
                    .collect())
            }
            Leaf::Value => Ok(self
                .select_elements(ctx, select)?
                .into_iter()
                .map(Selected::Element)
                .collect()),
        }
    }
}

enum Selected<'a> {
    Element(&'a Element),
    Text(&'a str),
}

enum Leaf<'a> {
    Value,
    Attr(&'a str),
    Text,
}

fn split_leaf(expr: &str) -> (&str, Leaf<'_>) {
    match expr.rsplit_once('/') {
        Some((path, last)) => {
            if let Some(attr) = last.strip_prefix('@') {
                (path, Leaf::Attr(attr))
            } else if last == "text()" {
                (path, Leaf::Text)
            } else {
                (expr, Leaf::Value)
            }
        }
        None if expr == "text()" => ("", Leaf::Text),
        None => (expr, Leaf::Value),
    }
}

fn check_path(path: &str) -> Result<()> {
    if path.contains("//") || path.split('/').any(|s| {
        s.is_empty() || s == ".." || s.contains(['@', '[', ']', '(', ')'])
    }) {
        return Err(ConvertError::Transform(format!(
            "unsupported select expression \"{path}\""
        )));
    }
    Ok(())
}

fn required_attr<'a>(elem: &'a Element, name: &str, instr: &str) -> Result<&'a str> {
    elem.attr(name).ok_or_else(|| {
        ConvertError::Transform(format!("{instr} without a {name} attribute"))
    })
}

/// Namespace prefix bound to the XSLT namespace on the stylesheet root,
/// falling back to the conventional `xsl`.
fn xslt_prefix(root: &Element) -> String {
    for (key, value) in &root.attributes {
        if value == XSLT_NS {
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                return prefix.to_string();
            }
        }
    }
    "xsl".to_string()
}

fn instruction_name<'a>(elem: &'a Element, prefix: &str) -> Option<&'a str> {
    let (p, local) = elem.name.split_once(':')?;
    (p == prefix).then_some(local)
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn esc_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn esc_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "br" | "hr" | "img" | "meta" | "link" | "input"
    )
}
