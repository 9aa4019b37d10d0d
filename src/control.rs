use serde::Deserialize;

/// How a control block is laid out in the generated file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    /// Declaration line; `{name}` and `{base}` are replaced.
    #[serde(default = "default_declaration")]
    pub declaration: String,
    #[serde(default = "default_open")]
    pub open: String,
    #[serde(default = "default_close")]
    pub close: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            declaration: default_declaration(),
            open: default_open(),
            close: default_close(),
        }
    }
}

fn default_declaration() -> String {
    "    public class {name} : {base}".to_string()
}

fn default_open() -> String {
    "    {".to_string()
}

fn default_close() -> String {
    "    }".to_string()
}

/// One control declared inside a types section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDef {
    pub name: String,
    pub base: String,
    /// Constructor lines, joined with `\n`.
    pub body: String,
}

impl ControlDef {
    pub fn new(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            body: String::new(),
        }
    }

    /// Appends this control's block to `out`.
    ///
    /// The block is a blank line, the declaration, the opening delimiter,
    /// the own body, the shared copy body and the closing delimiter. Empty
    /// bodies contribute no lines.
    pub fn render(&self, copy_body: &str, style: &RenderStyle, out: &mut String) {
        let declaration = style
            .declaration
            .replace("{name}", &self.name)
            .replace("{base}", &self.base);

        out.push('\n');
        push_line(out, &declaration);
        push_line(out, &style.open);
        if !self.body.is_empty() {
            push_line(out, &self.body);
        }
        if !copy_body.is_empty() {
            push_line(out, copy_body);
        }
        push_line(out, &style.close);
    }
}

fn push_line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}
